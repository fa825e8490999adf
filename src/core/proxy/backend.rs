use std::sync::Mutex;

use async_trait::async_trait;

use super::errors::ProxySettingsError;
use super::settings::ProxySettings;

/// Where proxy rules are installed.
#[async_trait]
pub trait ProxySettingsBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Replace the active rule. Applying the same rule twice is a plain overwrite.
    async fn apply(&self, settings: &ProxySettings) -> Result<(), ProxySettingsError>;

    async fn current(&self) -> Result<ProxySettings, ProxySettingsError>;
}

/// Records every applied rule; used by tests and by `proxy.backend = "memory"`.
#[derive(Default)]
pub struct MemoryProxyBackend {
    applied: Mutex<Vec<ProxySettings>>,
    failure: Mutex<Option<String>>,
}

impl MemoryProxyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `apply` fail with `reason` until cleared.
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = reason.map(str::to_string);
    }

    pub fn applied(&self) -> Vec<ProxySettings> {
        self.applied.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn last(&self) -> Option<ProxySettings> {
        self.applied
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl ProxySettingsBackend for MemoryProxyBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn apply(&self, settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        if let Some(reason) = self.failure.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(ProxySettingsError::command("memory apply", reason));
        }
        self.applied
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(settings.clone());
        Ok(())
    }

    async fn current(&self) -> Result<ProxySettings, ProxySettingsError> {
        Ok(self.last().unwrap_or(ProxySettings::System))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_records_and_fails() {
        let b = MemoryProxyBackend::new();
        assert_eq!(b.current().await.unwrap(), ProxySettings::System);

        let rule = ProxySettings::fixed("127.0.0.1", 7890, vec![]);
        b.apply(&rule).await.unwrap();
        b.apply(&rule).await.unwrap();
        assert_eq!(b.applied().len(), 2);
        assert_eq!(b.current().await.unwrap(), rule);

        b.set_failure(Some("locked by policy"));
        let err = b.apply(&ProxySettings::System).await.unwrap_err();
        assert!(err.to_string().contains("locked by policy"));
        assert_eq!(b.applied().len(), 2);
    }
}
