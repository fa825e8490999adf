use std::sync::Arc;

use super::backend::ProxySettingsBackend;
use super::errors::ProxySettingsError;
use super::settings::{
    default_bypass_list, select_proxy_port, ProxySettings, FALLBACK_PROXY_PORT,
};
use crate::core::controller::ClashConfig;

/// Installs and reverts the platform proxy rule.
#[derive(Clone)]
pub struct ProxyController {
    backend: Arc<dyn ProxySettingsBackend>,
    fallback_port: u16,
}

impl ProxyController {
    pub fn new(backend: Arc<dyn ProxySettingsBackend>) -> Self {
        Self {
            backend,
            fallback_port: FALLBACK_PROXY_PORT,
        }
    }

    pub fn with_fallback_port(mut self, port: u16) -> Self {
        if port > 0 {
            self.fallback_port = port;
        }
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Route traffic through `host:port`; an empty bypass list means the default one.
    pub async fn enable(
        &self,
        host: &str,
        port: u16,
        bypass_list: &[String],
    ) -> Result<(), ProxySettingsError> {
        let bypass = if bypass_list.is_empty() {
            default_bypass_list()
        } else {
            bypass_list.to_vec()
        };
        let settings = ProxySettings::fixed(host, port, bypass);
        self.backend.apply(&settings).await?;
        tracing::info!(target = "proxy", backend = self.backend.name(), host = %host, port, "proxy rule installed");
        Ok(())
    }

    pub async fn disable(&self) -> Result<(), ProxySettingsError> {
        self.backend.apply(&ProxySettings::System).await?;
        tracing::info!(target = "proxy", backend = self.backend.name(), "proxy rule reverted to system");
        Ok(())
    }

    pub async fn get_current(&self) -> Result<ProxySettings, ProxySettingsError> {
        self.backend.current().await
    }

    pub fn get_proxy_port(&self, config: &ClashConfig) -> u16 {
        select_proxy_port(config, self.fallback_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::proxy::backend::MemoryProxyBackend;

    #[tokio::test]
    async fn test_enable_uses_default_bypass_when_empty() {
        let backend = Arc::new(MemoryProxyBackend::new());
        let pc = ProxyController::new(backend.clone());
        pc.enable("127.0.0.1", 7890, &[]).await.unwrap();
        match backend.last().unwrap() {
            ProxySettings::FixedServers { host, port, bypass_list, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 7890);
                assert_eq!(bypass_list, default_bypass_list());
            }
            other => panic!("unexpected settings: {other:?}"),
        }
        pc.disable().await.unwrap();
        assert_eq!(pc.get_current().await.unwrap(), ProxySettings::System);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let backend = Arc::new(MemoryProxyBackend::new());
        backend.set_failure(Some("denied"));
        let pc = ProxyController::new(backend.clone());
        let err = pc.enable("127.0.0.1", 7890, &[]).await.unwrap_err();
        assert_eq!(err.category(), "command");
        assert!(backend.applied().is_empty());
    }

    #[test]
    fn test_fallback_port_override() {
        let pc = ProxyController::new(Arc::new(MemoryProxyBackend::new())).with_fallback_port(1080);
        assert_eq!(pc.get_proxy_port(&ClashConfig::default()), 1080);
        let pc = pc.with_fallback_port(0);
        assert_eq!(pc.get_proxy_port(&ClashConfig::default()), 1080);
    }
}
