use std::sync::Arc;

use super::backend::PermissionBackend;

/// Loopback hosts never need a grant.
pub const LOCAL_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "::1"];

/// How a permission request was initiated. Only a user gesture can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    UserGesture,
    Background,
}

pub fn is_local_host(host: &str) -> bool {
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    LOCAL_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
}

/// `http://{host}:*/*` with the host lowercased and IPv6 literals bracketed.
pub fn origin_pattern(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{host}]:*/*")
    } else {
        format!("http://{host}:*/*")
    }
}

/// Decides whether a controller host may be contacted.
///
/// Backend failures are logged and collapse to `false`.
#[derive(Clone)]
pub struct PermissionGate {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionGate {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    pub async fn has_permission(&self, host: &str) -> bool {
        if is_local_host(host) {
            return true;
        }
        let origin = origin_pattern(host);
        match self.backend.contains(&origin).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(target = "permission", host = %host, "permission lookup failed: {}", e);
                false
            }
        }
    }

    pub async fn request_permission(&self, host: &str, interaction: Interaction) -> bool {
        if is_local_host(host) {
            return true;
        }
        if interaction == Interaction::Background {
            tracing::debug!(target = "permission", host = %host, "background permission request refused");
            return false;
        }
        let origin = origin_pattern(host);
        match self.backend.request(&origin).await {
            Ok(granted) => {
                tracing::info!(target = "permission", host = %host, granted, "permission requested");
                granted
            }
            Err(e) => {
                tracing::warn!(target = "permission", host = %host, "permission request failed: {}", e);
                false
            }
        }
    }

    pub async fn ensure_permission(&self, host: &str, interaction: Interaction) -> bool {
        if self.has_permission(host).await {
            return true;
        }
        self.request_permission(host, interaction).await
    }

    /// `true` when a grant was removed. Loopback hosts cannot be revoked.
    pub async fn revoke_permission(&self, host: &str) -> bool {
        if is_local_host(host) {
            return false;
        }
        match self.backend.remove(&origin_pattern(host)).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(target = "permission", host = %host, "permission revoke failed: {}", e);
                false
            }
        }
    }

    /// Granted origin patterns, for display.
    pub async fn granted_origins(&self) -> Vec<String> {
        self.backend.list().await.unwrap_or_else(|e| {
            tracing::warn!(target = "permission", "permission listing failed: {}", e);
            Vec::new()
        })
    }
}
