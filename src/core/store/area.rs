//! Key/value persistence areas backing the `ConfigStore`
//!
//! A `StorageArea` is a flat map of JSON values. Every successful `set`
//! broadcasts a `StorageChange` to all subscribers of the area's channel.
//! Several areas may share one channel; subscribers filter by `AreaName`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use super::errors::{StoreError, StoreResult};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaName {
    Local,
    Sync,
}

impl std::fmt::Display for AreaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Sync => write!(f, "sync"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    pub area: AreaName,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

pub fn change_channel() -> broadcast::Sender<StorageChange> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

#[async_trait]
pub trait StorageArea: Send + Sync {
    fn name(&self) -> AreaName;

    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// In-process area, used by tests and as a scratch store.
pub struct MemoryStorageArea {
    name: AreaName,
    values: Mutex<BTreeMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStorageArea {
    pub fn new() -> Self {
        Self::with_channel(AreaName::Local, change_channel())
    }

    pub fn with_channel(name: AreaName, changes: broadcast::Sender<StorageChange>) -> Self {
        Self {
            name,
            values: Mutex::new(BTreeMap::new()),
            changes,
        }
    }

    /// Raw contents, for assertions.
    pub fn dump(&self) -> BTreeMap<String, Value> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Default for MemoryStorageArea {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorageArea {
    fn name(&self) -> AreaName {
        self.name
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let old_value = {
            let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
            values.insert(key.to_string(), value.clone())
        };
        let _ = self.changes.send(StorageChange {
            area: self.name,
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// A single JSON object on disk. Reads always hit the file so that writes
/// made by another process are observed.
pub struct FileStorageArea {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorageArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
            changes: change_channel(),
        }
    }

    /// `{base}/storage/local.json`
    pub fn at_base_dir(base: &Path) -> Self {
        Self::new(base.join("storage").join("local.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> StoreResult<serde_json::Map<String, Value>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new())
            }
            Err(e) => return Err(e.into()),
        };
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_slice::<Value>(&data)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Corrupt(format!(
                "{}: expected a JSON object, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn write_all(&self, map: &serde_json::Map<String, Value>) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageArea for FileStorageArea {
    fn name(&self) -> AreaName {
        AreaName::Local
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        let old_value = map.insert(key.to_string(), value.clone());
        self.write_all(&map).await?;
        tracing::debug!(target = "store", path = %self.path.display(), key = %key, "storage key written");
        let _ = self.changes.send(StorageChange {
            area: AreaName::Local,
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
