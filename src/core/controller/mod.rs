//! Clash controller REST API client
//!
//! - `client`: stateless request wrapper plus the boolean health check
//! - `types`: wire types for versions, configs, proxies, rules and connections
//! - `errors`: failure classification

pub mod client;
pub mod errors;
pub mod types;

pub use client::ControllerClient;
pub use errors::ControllerError;
pub use types::{
    ClashConfig, ClashVersion, ConfigPatch, Connection, ConnectionMetadata, ConnectionsResponse,
    DelayResult, ProxiesResponse, ProxyGroupType, ProxyHistory, ProxyNode, Rule, RulesResponse,
    RunMode, DEFAULT_DELAY_PROBE_URL, DEFAULT_DELAY_TIMEOUT_MS, DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
    PROXY_GROUP_TYPES,
};
