//! Failures while installing or reading the platform proxy rule

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxySettingsError {
    /// An external tool (gsettings / networksetup) exited non-zero
    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("system proxy is not supported: {0}")]
    Unsupported(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("proxy settings io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxySettingsError {
    pub fn command(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Unsupported(_) => "unsupported",
            Self::Registry(_) => "registry",
            Self::Io(_) => "io",
        }
    }
}
