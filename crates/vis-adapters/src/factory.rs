//! Build adapters by plugin name.

use tracing::info;
use vis_core::config::Config;
use vis_core::{AdapterError, Result};

use crate::adapter::DataAdapter;
use crate::{sensor_emulator, users};

/// Plugin identifiers this crate can build.
pub const PLUGINS: [&str; 2] = [sensor_emulator::PLUGIN, users::PLUGIN];

/// Create one adapter from its plugin name and `Params` object.
pub async fn new_adapter(
    plugin: &str,
    params: &serde_json::Value,
) -> Result<Box<dyn DataAdapter>> {
    let adapter: Box<dyn DataAdapter> = match plugin {
        sensor_emulator::PLUGIN => {
            Box::new(sensor_emulator::SensorEmulatorAdapter::new(params).await?)
        }
        users::PLUGIN => Box::new(users::UsersAdapter::new(params).await?),
        other => {
            return Err(AdapterError::Config(format!("Plugin {other} not supported")));
        }
    };

    Ok(adapter)
}

/// Create every enabled adapter, in configuration order.
///
/// Stops at the first adapter that fails; adapters already created are
/// closed before the error is returned.
pub async fn new_adapters(config: &Config) -> Result<Vec<Box<dyn DataAdapter>>> {
    let mut adapters = Vec::new();

    for entry in config.enabled_adapters() {
        match new_adapter(&entry.plugin, &entry.params).await {
            Ok(adapter) => {
                info!(plugin = %entry.plugin, name = %adapter.name(), "Adapter created");
                adapters.push(adapter);
            }
            Err(e) => {
                for adapter in &adapters {
                    adapter.close().await;
                }
                return Err(e);
            }
        }
    }

    Ok(adapters)
}
