use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use super::area::{AreaName, StorageArea, StorageChange};
use super::errors::StoreResult;
use super::model::{
    Profile, ProfilePatch, StoreState, ThemeMode, KEY_ACTIVE_CONFIG_ID, KEY_CONFIGS,
    KEY_PROXY_ENABLED, KEY_THEME_MODE,
};

/// Profile repository over a `StorageArea`.
///
/// Every accessor is a round trip to the area; defaults are substituted for
/// keys that were never written. Read-modify-write operations on the profile
/// list are serialised by `write_lock`, so concurrent callers sharing one
/// `ConfigStore` (or its clones) never lose an update. Writers in other
/// processes remain last-writer-wins.
#[derive(Clone)]
pub struct ConfigStore {
    area: Arc<dyn StorageArea>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ConfigStore {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    // ===== Profiles =====

    pub async fn get_configs(&self) -> StoreResult<Vec<Profile>> {
        self.get_or_default(KEY_CONFIGS).await
    }

    pub async fn set_configs(&self, configs: &[Profile]) -> StoreResult<()> {
        self.put(KEY_CONFIGS, &configs).await
    }

    pub async fn add_config(&self, config: Profile) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut configs = self.get_configs().await?;
        tracing::info!(target = "store", config_id = %config.id, host = %config.host, "profile added");
        configs.push(config);
        self.set_configs(&configs).await
    }

    /// Merge `patch` into the profile with `id`; unknown ids are ignored.
    pub async fn update_config(&self, id: &str, patch: ProfilePatch) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut configs = self.get_configs().await?;
        let Some(profile) = configs.iter_mut().find(|c| c.id == id) else {
            tracing::debug!(target = "store", config_id = %id, "update for unknown profile ignored");
            return Ok(());
        };
        patch.apply(profile);
        self.set_configs(&configs).await
    }

    /// Remove the profile and clear the active pointer if it referenced it.
    pub async fn delete_config(&self, id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut configs = self.get_configs().await?;
        configs.retain(|c| c.id != id);
        self.set_configs(&configs).await?;
        if self.get_active_config_id().await?.as_deref() == Some(id) {
            self.set_active_config_id(None).await?;
            tracing::info!(target = "store", config_id = %id, "active profile deleted, pointer cleared");
        }
        Ok(())
    }

    pub async fn get_config_by_id(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.get_configs().await?.into_iter().find(|c| c.id == id))
    }

    // ===== Active profile =====

    pub async fn get_active_config_id(&self) -> StoreResult<Option<String>> {
        self.get_or_default(KEY_ACTIVE_CONFIG_ID).await
    }

    pub async fn set_active_config_id(&self, id: Option<&str>) -> StoreResult<()> {
        self.put(KEY_ACTIVE_CONFIG_ID, &id).await
    }

    pub async fn get_active_config(&self) -> StoreResult<Option<Profile>> {
        match self.get_active_config_id().await? {
            Some(id) if !id.is_empty() => self.get_config_by_id(&id).await,
            _ => Ok(None),
        }
    }

    // ===== Proxy flag / theme =====

    pub async fn get_proxy_enabled(&self) -> StoreResult<bool> {
        self.get_or_default(KEY_PROXY_ENABLED).await
    }

    pub async fn set_proxy_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.put(KEY_PROXY_ENABLED, &enabled).await
    }

    pub async fn get_theme_mode(&self) -> StoreResult<ThemeMode> {
        self.get_or_default(KEY_THEME_MODE).await
    }

    pub async fn set_theme_mode(&self, mode: ThemeMode) -> StoreResult<()> {
        self.put(KEY_THEME_MODE, &mode).await
    }

    pub async fn snapshot(&self) -> StoreResult<StoreState> {
        Ok(StoreState {
            proxy_enabled: self.get_proxy_enabled().await?,
            active_config_id: self.get_active_config_id().await?,
            configs: self.get_configs().await?,
            theme_mode: self.get_theme_mode().await?,
        })
    }

    /// Subscribe to changes of the local area only.
    pub fn on_changed(&self) -> StoreChanges {
        StoreChanges {
            rx: self.area.subscribe(),
        }
    }

    async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> StoreResult<T> {
        let Some(raw) = self.area.get(key).await? else {
            return Ok(T::default());
        };
        if raw.is_null() {
            return Ok(T::default());
        }
        match serde_json::from_value::<T>(raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(target = "store", key = %key, "stored value has unexpected shape, using default: {}", e);
                Ok(T::default())
            }
        }
    }

    async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value: Value = serde_json::to_value(value)?;
        self.area.set(key, value).await
    }
}

/// Change feed filtered to `AreaName::Local`.
pub struct StoreChanges {
    rx: broadcast::Receiver<StorageChange>,
}

impl StoreChanges {
    /// Next local change; `None` once the area is gone.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.area == AreaName::Local => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target = "store", skipped, "change subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
