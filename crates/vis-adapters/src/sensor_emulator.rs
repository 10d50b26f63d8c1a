//! Sensor emulator adapter.
//!
//! Polls `GET <SensorURL>/stats` every `UpdatePeriod` milliseconds and
//! exposes the document under `Signal.Emulator.*`. Writes to the
//! `Attribute.Emulator.*` paths are forwarded as
//! `POST <SensorURL>/attributes/` and committed locally once the emulator
//! answers `201 Created`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use url::Url;

use vis_core::config::{parse_params, parse_params_json};
use vis_core::tree::{flatten_json, unflatten_for_write};
use vis_core::{AdapterError, DataEntry, DataMap, PathStore, Result};

use crate::adapter::DataAdapter;
use crate::base::BaseAdapter;

/// Plugin identifier used in the service configuration.
pub const PLUGIN: &str = "sensoremulatoradapter";

/// Adapter name reported to the VIS server.
pub const NAME: &str = "SensorEmulatorAdapter";

/// Namespace of the signals read from `/stats`.
pub const SIGNAL_PREFIX: &str = "Signal.Emulator";

/// Namespace of the writable emulator attributes.
pub const ATTRIBUTE_PREFIX: &str = "Attribute.Emulator";

/// Attributes the emulator accepts on `/attributes/`.
pub const ATTRIBUTES: [&str; 7] = [
    "rectangle_long0",
    "rectangle_lat0",
    "rectangle_long1",
    "rectangle_lat1",
    "to_rectangle",
    "stop",
    "tire_break",
];

const DEFAULT_UPDATE_PERIOD_MS: u64 = 500;
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct SensorEmulatorConfig {
    #[serde(rename = "SensorURL", default)]
    sensor_url: String,

    /// Poll interval in milliseconds.
    #[serde(rename = "UpdatePeriod", default = "default_update_period")]
    update_period: u64,
}

fn default_update_period() -> u64 {
    DEFAULT_UPDATE_PERIOD_MS
}

fn upstream_io(err: reqwest::Error) -> AdapterError {
    AdapterError::UpstreamIo(err.to_string())
}

/// HTTP endpoints of one sensor emulator.
#[derive(Debug)]
struct Upstream {
    client: Client,
    stats_url: Url,
    attributes_url: Url,
}

impl Upstream {
    fn new(sensor_url: &str) -> Result<Self> {
        let mut base = Url::parse(sensor_url)
            .map_err(|e| AdapterError::Config(format!("SensorURL {sensor_url}: {e}")))?;

        // Resolve relative endpoints below the configured path, not beside it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let join = |endpoint: &str| {
            base.join(endpoint)
                .map_err(|e| AdapterError::Config(format!("SensorURL {sensor_url}: {e}")))
        };

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AdapterError::Config(e.to_string()))?;

        Ok(Self {
            client,
            stats_url: join("stats")?,
            attributes_url: join("attributes/")?,
        })
    }

    /// Fetch the current signals, flattened under [`SIGNAL_PREFIX`].
    async fn fetch(&self) -> Result<DataMap> {
        let res = self
            .client
            .get(self.stats_url.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(upstream_io)?;

        let body = res.bytes().await.map_err(upstream_io)?;

        debug!(
            url = %self.stats_url,
            "Get data from sensor emulator: {}",
            String::from_utf8_lossy(&body)
        );

        flatten_json(SIGNAL_PREFIX, &body)
    }

    /// Send attribute values; anything but `201 Created` is a rejection.
    async fn write(&self, attributes: &DataMap) -> Result<()> {
        debug!(
            url = %self.attributes_url,
            "Set data to sensor emulator: {}",
            serde_json::to_string(attributes)?
        );

        let res = self
            .client
            .post(self.attributes_url.clone())
            .json(attributes)
            .send()
            .await
            .map_err(upstream_io)?;

        if res.status() != StatusCode::CREATED {
            return Err(AdapterError::UpstreamRejected(res.status().to_string()));
        }

        Ok(())
    }
}

/// Adapter backed by the HTTP sensor emulator.
#[derive(Debug)]
pub struct SensorEmulatorAdapter {
    base: Arc<BaseAdapter>,
    upstream: Arc<Upstream>,
    update_period: Duration,
    shutdown: watch::Sender<bool>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl SensorEmulatorAdapter {
    /// Create the adapter from its `Params` object.
    ///
    /// Performs the initial fetch; the adapter is not created if the
    /// emulator can't be reached. Must be called within a tokio runtime.
    pub async fn new(params: &serde_json::Value) -> Result<Self> {
        Self::with_config(parse_params(params)?).await
    }

    /// Create the adapter from raw JSON configuration.
    pub async fn from_json(config: &[u8]) -> Result<Self> {
        Self::with_config(parse_params_json(config)?).await
    }

    async fn with_config(cfg: SensorEmulatorConfig) -> Result<Self> {
        info!("Create sensor emulator adapter");

        if cfg.sensor_url.is_empty() {
            return Err(AdapterError::Config("Sensor URL should be defined".into()));
        }
        if cfg.update_period == 0 {
            return Err(AdapterError::Config("Update period should be positive".into()));
        }

        let upstream = Arc::new(Upstream::new(&cfg.sensor_url)?);

        let store = PathStore::new();
        for (path, value) in upstream.fetch().await? {
            store.insert(path, DataEntry::new(value));
        }
        for attribute in ATTRIBUTES {
            store.insert(format!("{ATTRIBUTE_PREFIX}.{attribute}"), DataEntry::empty());
        }

        let base = Arc::new(BaseAdapter::new(NAME, store));
        let update_period = Duration::from_millis(cfg.update_period);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let refresh = tokio::spawn(refresh_loop(
            base.clone(),
            upstream.clone(),
            update_period,
            shutdown_rx,
        ));

        Ok(Self {
            base,
            upstream,
            update_period,
            shutdown,
            refresh: Mutex::new(Some(refresh)),
        })
    }

    /// Poll interval.
    pub fn update_period(&self) -> Duration {
        self.update_period
    }
}

/// Poll the emulator until shutdown. A failed tick is logged and skipped.
async fn refresh_loop(
    base: Arc<BaseAdapter>,
    upstream: Arc<Upstream>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick is immediate; the store was populated just now.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            // Fires on close() and when the adapter is dropped.
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let fetched = upstream.fetch().await;
        // Closed while the poll was in flight: drop the result.
        if shutdown.has_changed().unwrap_or(true) {
            break;
        }

        let data = match fetched {
            Ok(data) => data,
            Err(e) => {
                error!("Can't read data: {}", e);
                continue;
            }
        };

        if let Err(e) = base.set_data(data) {
            error!("Can't update data: {}", e);
        }
    }

    debug!(adapter = %base.name(), "Refresh stopped");
}

#[async_trait]
impl DataAdapter for SensorEmulatorAdapter {
    fn base(&self) -> &BaseAdapter {
        &self.base
    }

    async fn set_data(&self, data: DataMap) -> Result<()> {
        let attributes = unflatten_for_write(&data, ATTRIBUTE_PREFIX)?;

        // Don't let the emulator accept what the store would then refuse.
        if let Some(unknown) = data.keys().find(|p| !self.base.store().contains(p)) {
            return Err(AdapterError::PathNotFound(unknown.clone()));
        }

        self.upstream.write(&attributes).await?;
        self.base.set_data(data)
    }

    async fn close(&self) {
        let _ = self.shutdown.send(true);

        let refresh = self
            .refresh
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = refresh {
            // Let an in-flight poll finish before the channel closes.
            if let Err(e) = handle.await {
                error!("Refresh task failed: {}", e);
            }
        }

        self.base.close();
    }
}
