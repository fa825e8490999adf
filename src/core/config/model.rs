use serde::{Deserialize, Serialize};

use crate::core::controller::{
    DEFAULT_DELAY_PROBE_URL, DEFAULT_DELAY_TIMEOUT_MS, DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
};
use crate::core::proxy::FALLBACK_PROXY_PORT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerCfg {
    #[serde(default = "default_request_timeout_ms")] pub request_timeout_ms: u64,
    #[serde(default = "default_health_check_timeout_ms")] pub health_check_timeout_ms: u64,
    #[serde(default = "default_delay_probe_url")] pub delay_probe_url: String,
    #[serde(default = "default_delay_timeout_ms")] pub delay_timeout_ms: u64,
}

/// Which `ProxySettingsBackend` the app installs rules through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyBackendKind {
    #[default]
    System,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyCfg {
    #[serde(default = "default_fallback_port")] pub fallback_port: u16,
    #[serde(default)] pub backend: ProxyBackendKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingCfg {
    #[serde(default = "default_log_level")] pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)] pub controller: ControllerCfg,
    #[serde(default)] pub proxy: ProxyCfg,
    #[serde(default)] pub logging: LoggingCfg,
}

fn default_request_timeout_ms() -> u64 { 5000 }
fn default_health_check_timeout_ms() -> u64 { DEFAULT_HEALTH_CHECK_TIMEOUT_MS }
fn default_delay_probe_url() -> String { DEFAULT_DELAY_PROBE_URL.to_string() }
fn default_delay_timeout_ms() -> u64 { DEFAULT_DELAY_TIMEOUT_MS }
fn default_fallback_port() -> u16 { FALLBACK_PROXY_PORT }
fn default_log_level() -> String { "info".to_string() }

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            delay_probe_url: default_delay_probe_url(),
            delay_timeout_ms: default_delay_timeout_ms(),
        }
    }
}

impl Default for ProxyCfg {
    fn default() -> Self {
        Self { fallback_port: default_fallback_port(), backend: ProxyBackendKind::default() }
    }
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}
