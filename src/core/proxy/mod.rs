//! Platform proxy rule management
//!
//! This module provides:
//! - `settings`: the rule model, port selection and bypass-list derivation
//! - `backend`: the `ProxySettingsBackend` seam and an in-memory backend
//! - `system`: the OS system-proxy backend (Linux/macOS/Windows)
//! - `controller`: `ProxyController`, which installs and reverts rules

pub mod backend;
pub mod controller;
pub mod errors;
pub mod settings;
pub mod system;

pub use backend::{MemoryProxyBackend, ProxySettingsBackend};
pub use controller::ProxyController;
pub use errors::ProxySettingsError;
pub use settings::{
    default_bypass_list, effective_bypass_list, get_proxy_port, select_proxy_port, ProxyScheme,
    ProxySettings, DEFAULT_BYPASS_LIST, FALLBACK_PROXY_PORT,
};
pub use system::SystemProxyBackend;
