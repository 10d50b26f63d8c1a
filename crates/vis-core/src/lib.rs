//! # vis-core
//!
//! Shared substrate for VIS data adapters.
//!
//! This crate provides:
//! - Data model types (DataEntry, DataMap)
//! - Path helpers and the path tree codec (flatten / unflatten for write)
//! - The path store with diff-based change detection and subscriptions
//! - The notification conduit that carries subscribed changes to a consumer
//! - Service and adapter configuration types
//!
//! This crate contains no async code of its own and never starts a runtime.
//! The conduit relies on `tokio::sync` primitives only, so any executor can
//! drive the consumer side.

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod path;
pub mod store;
pub mod tree;

pub use error::{AdapterError, Result};
pub use model::*;
pub use notify::{conduit, Notifier, SubscribeChannel, TryRecvError};
pub use store::PathStore;
