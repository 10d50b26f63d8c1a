//! Service and adapter configuration.
//!
//! The service reads one JSON document listing the adapters to load. Each
//! adapter receives its own `Params` object and parses it into the shape it
//! needs; unknown fields are ignored so adapters can share one document
//! format.

use crate::error::AdapterError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur while loading the service configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    NotFound(String),
    /// Failed to read the configuration file.
    ReadError(String),
    /// Configuration data is invalid.
    InvalidData(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Configuration not found: {}", path),
            ConfigError::ReadError(msg) => write!(f, "Read error: {}", msg),
            ConfigError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Address the VIS server listens on (consumed by the outer server).
    #[serde(rename = "ServerURL")]
    pub server_url: String,

    /// TLS certificate for the VIS server.
    #[serde(rename = "VISCert")]
    pub vis_cert: String,

    /// TLS key for the VIS server.
    #[serde(rename = "VISKey")]
    pub vis_key: String,

    /// Adapters to load, in order.
    pub adapters: Vec<AdapterConfig>,
}

/// One adapter entry in the service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdapterConfig {
    /// Plugin identifier, e.g. "sensoremulatoradapter".
    pub plugin: String,

    /// Skip this adapter when true.
    pub disabled: bool,

    /// Adapter-specific parameters.
    pub params: serde_json::Value,
}

impl Config {
    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::ReadError(e.to_string()),
        })?;
        Self::from_json(&json)
    }

    /// Adapters that are not disabled, in configuration order.
    pub fn enabled_adapters(&self) -> impl Iterator<Item = &AdapterConfig> {
        self.adapters.iter().filter(|a| !a.disabled)
    }
}

/// Deserialize adapter parameters, mapping failures to `AdapterError::Config`.
///
/// A missing `Params` object (`null`) is treated as an empty one so that
/// defaults apply and required-field checks report the field by name.
pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, AdapterError> {
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| AdapterError::Config(e.to_string()))
}

/// Same as [`parse_params`], from raw JSON bytes.
pub fn parse_params_json<T: DeserializeOwned>(json: &[u8]) -> Result<T, AdapterError> {
    let value: serde_json::Value =
        serde_json::from_slice(json).map_err(|e| AdapterError::Config(e.to_string()))?;
    parse_params(&value)
}
