//! Users adapter.
//!
//! Serves the list of vehicle users (claims) at a single configurable path.
//! The list lives in a plain text file, one claim per line. A missing file
//! is an empty list.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use vis_core::config::{parse_params, parse_params_json};
use vis_core::{AdapterError, DataEntry, DataMap, PathStore, Result, Value};

use crate::adapter::DataAdapter;
use crate::base::BaseAdapter;

/// Plugin identifier used in the service configuration.
pub const PLUGIN: &str = "usersadapter";

/// Adapter name reported to the VIS server.
pub const NAME: &str = "usersadapter";

#[derive(Debug, Deserialize)]
struct UsersConfig {
    #[serde(rename = "VISPath", default)]
    vis_path: String,

    #[serde(rename = "FilePath", default)]
    file_path: PathBuf,
}

/// Adapter backed by a newline-delimited users file.
#[derive(Debug)]
pub struct UsersAdapter {
    base: BaseAdapter,
    vis_path: String,
    file_path: PathBuf,
    /// Serializes file rewrites so file and store commit in the same order.
    write_lock: tokio::sync::Mutex<()>,
}

impl UsersAdapter {
    /// Create the adapter from its `Params` object.
    pub async fn new(params: &serde_json::Value) -> Result<Self> {
        Self::with_config(parse_params(params)?).await
    }

    /// Create the adapter from raw JSON configuration.
    pub async fn from_json(config: &[u8]) -> Result<Self> {
        Self::with_config(parse_params_json(config)?).await
    }

    async fn with_config(cfg: UsersConfig) -> Result<Self> {
        info!("Create users adapter");

        if cfg.vis_path.is_empty() {
            return Err(AdapterError::Config("VIS path should be defined".into()));
        }
        if cfg.file_path.as_os_str().is_empty() {
            return Err(AdapterError::Config("File path should be defined".into()));
        }

        let users = read_users(&cfg.file_path).await?;
        debug!(file = %cfg.file_path.display(), count = users.len(), "Read users");

        let store = PathStore::from_entries([(
            cfg.vis_path.clone(),
            DataEntry::new(users_value(&users)),
        )]);

        Ok(Self {
            base: BaseAdapter::new(NAME, store),
            vis_path: cfg.vis_path,
            file_path: cfg.file_path,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Path the user list is served at.
    pub fn vis_path(&self) -> &str {
        &self.vis_path
    }

    /// Backing file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

#[async_trait]
impl DataAdapter for UsersAdapter {
    fn base(&self) -> &BaseAdapter {
        &self.base
    }

    async fn set_data(&self, data: DataMap) -> Result<()> {
        if let Some(unknown) = data.keys().find(|p| **p != self.vis_path) {
            return Err(AdapterError::PathNotFound(unknown.clone()));
        }

        let Some(value) = data.get(&self.vis_path) else {
            return Ok(());
        };
        let users = parse_users(&self.vis_path, value)?;

        let _guard = self.write_lock.lock().await;
        write_users(&self.file_path, &users).await?;
        debug!(file = %self.file_path.display(), count = users.len(), "Write users");

        self.base.set_data(data)
    }
}

fn users_value(users: &[String]) -> Value {
    Value::Array(users.iter().cloned().map(Value::String).collect())
}

fn parse_users(path: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || AdapterError::InvalidValue(path.to_string());

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|claim| match claim.as_str() {
            // One claim per line: an embedded newline would split it on read.
            Some(s) if !s.is_empty() && !s.contains(['\n', '\r']) => Ok(s.to_string()),
            _ => Err(invalid()),
        })
        .collect()
}

async fn read_users(file: &Path) -> Result<Vec<String>> {
    match tokio::fs::read_to_string(file).await {
        Ok(content) => Ok(content
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(AdapterError::UpstreamIo(format!("{}: {}", file.display(), e))),
    }
}

/// Replace the file atomically: write a sibling temp file, then rename.
async fn write_users(file: &Path, users: &[String]) -> Result<()> {
    let mut content = String::new();
    for claim in users {
        content.push_str(claim);
        content.push('\n');
    }

    let mut tmp = file.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err =
        |e: std::io::Error| AdapterError::UpstreamIo(format!("{}: {}", file.display(), e));

    tokio::fs::write(&tmp, content).await.map_err(io_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, file).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(e));
    }

    Ok(())
}
