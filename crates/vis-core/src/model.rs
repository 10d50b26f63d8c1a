//! VIS adapter data model types.
//!
//! Values are opaque JSON payloads addressed by flat, dot-separated paths.
//! The store never interprets them beyond structural equality.

use std::collections::HashMap;

/// A signal or attribute value.
pub type Value = serde_json::Value;

/// Flat mapping from path to value, as exchanged with the outer server.
pub type DataMap = HashMap<String, Value>;

/// One row of the path store.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    /// Current value at the path (`null` until first written)
    pub value: Value,

    /// Whether the path may be read without authorization
    pub is_public: bool,
}

impl DataEntry {
    /// Public access is granted to every path until an authorization
    /// service decides per path. Adapters that need restricted paths
    /// construct entries with `is_public: false` explicitly.
    pub const DEFAULT_PUBLIC: bool = true;

    /// Create an entry with the given value and default visibility.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            is_public: Self::DEFAULT_PUBLIC,
        }
    }

    /// Create an entry with no value yet (attributes written later).
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    /// Create an entry that requires authorization to access.
    pub fn restricted(value: Value) -> Self {
        Self {
            value,
            is_public: false,
        }
    }
}

impl Default for DataEntry {
    fn default() -> Self {
        Self::empty()
    }
}
