use thiserror::Error;

use crate::core::controller::ControllerError;
use crate::core::proxy::ProxySettingsError;
use crate::core::store::StoreError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No active configuration")]
    NoActiveConfig,

    #[error("Permission denied for host {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    ProxySettings(#[from] ProxySettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoActiveConfig => "no_active_config",
            Self::PermissionDenied(_) => "permission",
            Self::Controller(_) => "controller",
            Self::ProxySettings(_) => "proxy_settings",
            Self::Store(_) => "store",
        }
    }
}
