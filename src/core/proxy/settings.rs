//! Platform proxy rule model and the pure helpers that derive it

use serde::{Deserialize, Serialize};

use crate::core::controller::ClashConfig;

/// Port used when the controller reports no listening port at all.
pub const FALLBACK_PROXY_PORT: u16 = 7890;

pub const DEFAULT_BYPASS_LIST: [&str; 4] = ["localhost", "127.0.0.1", "*.local", "<local>"];

pub fn default_bypass_list() -> Vec<String> {
    DEFAULT_BYPASS_LIST.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Http,
}

impl std::fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
        }
    }
}

/// What is installed as the platform proxy rule.
///
/// `System` hands control back to whatever the platform does by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProxySettings {
    #[serde(rename_all = "camelCase")]
    FixedServers {
        scheme: ProxyScheme,
        host: String,
        port: u16,
        bypass_list: Vec<String>,
    },
    System,
}

impl ProxySettings {
    pub fn fixed(host: impl Into<String>, port: u16, bypass_list: Vec<String>) -> Self {
        Self::FixedServers {
            scheme: ProxyScheme::Http,
            host: host.into(),
            port,
            bypass_list,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::FixedServers { .. })
    }
}

/// mixed-port > port > socks-port > `FALLBACK_PROXY_PORT`
pub fn get_proxy_port(config: &ClashConfig) -> u16 {
    select_proxy_port(config, FALLBACK_PROXY_PORT)
}

pub fn select_proxy_port(config: &ClashConfig, fallback: u16) -> u16 {
    [config.mixed_port, config.port, config.socks_port]
        .into_iter()
        .find(|p| *p > 0)
        .unwrap_or(fallback)
}

/// Configured list (default when absent or empty) with the controller host
/// appended so the controller itself is never reached through the proxy.
pub fn effective_bypass_list(configured: Option<&[String]>, controller_host: &str) -> Vec<String> {
    let mut list = match configured {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => default_bypass_list(),
    };
    let host = controller_host.trim();
    if !host.is_empty() && !list.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        list.push(host.to_string());
    }
    list
}
