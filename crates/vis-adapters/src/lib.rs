//! # vis-adapters
//!
//! Data adapters for the VIS server.
//!
//! Every adapter exposes the same path-addressed surface ([`DataAdapter`])
//! on top of a [`vis_core::PathStore`]; only the upstream I/O differs:
//! - `sensor_emulator` - polls a sensor emulator over HTTP
//! - `users` - keeps the vehicle user list in a plain text file
//!
//! [`factory`] builds adapters by plugin name from the service configuration.

pub mod adapter;
pub mod base;
pub mod factory;
pub mod sensor_emulator;
pub mod users;

pub use adapter::DataAdapter;
pub use base::BaseAdapter;
pub use factory::{new_adapter, new_adapters};
pub use sensor_emulator::SensorEmulatorAdapter;
pub use users::UsersAdapter;
pub use vis_core::{AdapterError, DataMap, Result, SubscribeChannel};
