use std::collections::BTreeMap;
use std::time::Duration;

use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request};
use serde::de::DeserializeOwned;
use urlencoding::encode;

use crate::core::store::model::Profile;

use super::errors::{api_error, ControllerError};
use super::types::{
    ClashConfig, ClashVersion, ConfigPatch, ConnectionsResponse, DelayResult, ProxiesResponse,
    ProxyNode, RulesResponse,
};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// 无状态的控制器 API 客户端：每次调用都是一个独立的 HTTP+JSON 往返
#[derive(Clone)]
pub struct ControllerClient {
    base_url: String,
    secret: Option<String>,
    request_timeout: Duration,
    http: Client<HttpConnector>,
}

impl std::fmt::Debug for ControllerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerClient")
            .field("base_url", &self.base_url)
            .field("has_secret", &self.secret.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ControllerClient {
    pub fn new(host: &str, port: u16, secret: Option<&str>) -> Self {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Self {
            base_url: format!("http://{host}:{port}"),
            secret: secret.filter(|s| !s.is_empty()).map(str::to_string),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            http: Client::new(),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(&profile.host, profile.port, profile.secret.as_deref())
    }

    /// Upper bound for a single request/response exchange.
    pub fn with_request_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_version(&self) -> Result<ClashVersion, ControllerError> {
        self.get_json("/version").await
    }

    pub async fn get_config(&self) -> Result<ClashConfig, ControllerError> {
        self.get_json("/configs").await
    }

    pub async fn patch_config(&self, patch: &ConfigPatch) -> Result<(), ControllerError> {
        let body = serde_json::to_vec(patch).map_err(|e| ControllerError::Decode(e.to_string()))?;
        self.request(Method::PATCH, "/configs", Some(body)).await?;
        Ok(())
    }

    pub async fn get_proxies(&self) -> Result<ProxiesResponse, ControllerError> {
        self.get_json("/proxies").await
    }

    pub async fn get_proxy(&self, name: &str) -> Result<ProxyNode, ControllerError> {
        self.get_json(&format!("/proxies/{}", encode(name))).await
    }

    pub async fn switch_proxy(&self, group: &str, member: &str) -> Result<(), ControllerError> {
        let body = serde_json::to_vec(&serde_json::json!({ "name": member }))
            .map_err(|e| ControllerError::Decode(e.to_string()))?;
        self.request(Method::PUT, &format!("/proxies/{}", encode(group)), Some(body))
            .await?;
        tracing::info!(target = "controller", group = %group, member = %member, "proxy switched");
        Ok(())
    }

    pub async fn test_proxy_delay(
        &self,
        name: &str,
        probe_url: &str,
        timeout_ms: u64,
    ) -> Result<DelayResult, ControllerError> {
        let path = format!(
            "/proxies/{}/delay?url={}&timeout={}",
            encode(name),
            encode(probe_url),
            timeout_ms
        );
        self.get_json(&path).await
    }

    pub async fn test_group_delay(
        &self,
        group: &str,
        probe_url: &str,
        timeout_ms: u64,
    ) -> Result<BTreeMap<String, u64>, ControllerError> {
        let path = format!(
            "/group/{}/delay?url={}&timeout={}",
            encode(group),
            encode(probe_url),
            timeout_ms
        );
        self.get_json(&path).await
    }

    pub async fn get_rules(&self) -> Result<RulesResponse, ControllerError> {
        self.get_json("/rules").await
    }

    pub async fn get_connections(&self) -> Result<ConnectionsResponse, ControllerError> {
        self.get_json("/connections").await
    }

    pub async fn close_connection(&self, id: &str) -> Result<(), ControllerError> {
        self.request(Method::DELETE, &format!("/connections/{}", encode(id)), None)
            .await?;
        Ok(())
    }

    pub async fn close_all_connections(&self) -> Result<(), ControllerError> {
        self.request(Method::DELETE, "/connections", None).await?;
        Ok(())
    }

    /// 轻量可达性探测：任何失败（网络、非 2xx、超时）都折叠为 `false`
    pub async fn health_check(&self, timeout_ms: u64) -> bool {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.get_version()).await {
            Ok(Ok(version)) => {
                tracing::debug!(target = "controller", base = %self.base_url, version = %version.version, "health check ok");
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(target = "controller", base = %self.base_url, category = e.category(), "health check failed: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!(target = "controller", base = %self.base_url, timeout_ms, "health check timed out");
                false
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControllerError> {
        let bytes = self.request(Method::GET, path, None).await?;
        serde_json::from_slice(&bytes).map_err(|e| ControllerError::Decode(e.to_string()))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ControllerError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            builder = builder.header(AUTHORIZATION, format!("Bearer {secret}"));
        }
        let req = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| ControllerError::InvalidUri(format!("{url}: {e}")))?;

        let timeout_ms = self.request_timeout.as_millis() as u64;
        let exchange = async {
            let resp = self
                .http
                .request(req)
                .await
                .map_err(|e| ControllerError::Network(e.to_string()))?;
            let status = resp.status();
            let bytes = hyper::body::to_bytes(resp.into_body())
                .await
                .map_err(|e| ControllerError::Network(e.to_string()))?;
            Ok::<_, ControllerError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| ControllerError::Timeout(timeout_ms))??;

        tracing::trace!(target = "controller", method = %method, path = %path, status = status.as_u16(), "controller response");
        if !status.is_success() {
            return Err(api_error(status, &bytes));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_plain_and_ipv6() {
        assert_eq!(ControllerClient::new("127.0.0.1", 9090, None).base_url(), "http://127.0.0.1:9090");
        assert_eq!(ControllerClient::new("::1", 9090, None).base_url(), "http://[::1]:9090");
        assert_eq!(ControllerClient::new("[::1]", 9090, None).base_url(), "http://[::1]:9090");
    }

    #[test]
    fn test_empty_secret_is_absent() {
        let client = ControllerClient::new("localhost", 9090, Some(""));
        assert!(client.secret.is_none());
        let client = ControllerClient::new("localhost", 9090, Some("s3cret"));
        assert_eq!(client.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_debug_masks_secret() {
        let client = ControllerClient::new("localhost", 9090, Some("s3cret"));
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("has_secret: true"));
    }

    #[tokio::test]
    async fn test_health_check_unreachable_is_false() {
        // 先占用再释放端口，确保无监听者
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let client = ControllerClient::new("127.0.0.1", port, None);
        assert!(!client.health_check(500).await);
    }
}
