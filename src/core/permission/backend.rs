//! Host-permission backends
//!
//! Backends deal in origin patterns (`http://{host}:*/*`) and know nothing
//! about loopback exemptions or interaction kinds; `PermissionGate` owns
//! those rules.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::PermissionError;

#[async_trait]
pub trait PermissionBackend: Send + Sync {
    async fn contains(&self, origin: &str) -> Result<bool, PermissionError>;

    /// Ask for `origin`; `Ok(true)` when it is granted afterwards.
    async fn request(&self, origin: &str) -> Result<bool, PermissionError>;

    /// `Ok(true)` when something was removed.
    async fn remove(&self, origin: &str) -> Result<bool, PermissionError>;

    async fn list(&self) -> Result<Vec<String>, PermissionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantPolicy {
    GrantAll,
    DenyAll,
}

pub struct MemoryPermissionBackend {
    policy: GrantPolicy,
    granted: Mutex<BTreeSet<String>>,
    requests: AtomicUsize,
}

impl MemoryPermissionBackend {
    pub fn new(policy: GrantPolicy) -> Self {
        Self {
            policy,
            granted: Mutex::new(BTreeSet::new()),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_granted<I, S>(self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.granted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(origins.into_iter().map(Into::into));
        self
    }

    /// How many times `request` reached this backend.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionBackend for MemoryPermissionBackend {
    async fn contains(&self, origin: &str) -> Result<bool, PermissionError> {
        Ok(self
            .granted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(origin))
    }

    async fn request(&self, origin: &str) -> Result<bool, PermissionError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut granted = self.granted.lock().unwrap_or_else(|p| p.into_inner());
        match self.policy {
            GrantPolicy::GrantAll => {
                granted.insert(origin.to_string());
                Ok(true)
            }
            GrantPolicy::DenyAll => Ok(granted.contains(origin)),
        }
    }

    async fn remove(&self, origin: &str) -> Result<bool, PermissionError> {
        Ok(self
            .granted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(origin))
    }

    async fn list(&self) -> Result<Vec<String>, PermissionError> {
        Ok(self
            .granted
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PermissionFile {
    #[serde(default)]
    origins: BTreeSet<String>,
}

/// Granted origins persisted as `{"origins": [...]}`. A request grants
/// immediately; the gate only forwards user-initiated requests.
pub struct FilePermissionBackend {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FilePermissionBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `{base}/storage/permissions.json`
    pub fn at_base_dir(base: &Path) -> Self {
        Self::new(base.join("storage").join("permissions.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<PermissionFile, PermissionError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.iter().all(|b| b.is_ascii_whitespace()) => Ok(PermissionFile::default()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PermissionFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, file: &PermissionFile) -> Result<(), PermissionError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(file)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionBackend for FilePermissionBackend {
    async fn contains(&self, origin: &str) -> Result<bool, PermissionError> {
        Ok(self.load().await?.origins.contains(origin))
    }

    async fn request(&self, origin: &str) -> Result<bool, PermissionError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        if file.origins.insert(origin.to_string()) {
            self.save(&file).await?;
            tracing::info!(target = "permission", origin = %origin, "origin granted");
        }
        Ok(true)
    }

    async fn remove(&self, origin: &str) -> Result<bool, PermissionError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        let removed = file.origins.remove(origin);
        if removed {
            self.save(&file).await?;
            tracing::info!(target = "permission", origin = %origin, "origin revoked");
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<String>, PermissionError> {
        Ok(self.load().await?.origins.into_iter().collect())
    }
}
