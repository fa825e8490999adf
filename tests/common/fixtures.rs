use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clash_switchboard_lib::core::orchestrator::{Orchestrator, OrchestratorOptions};
use clash_switchboard_lib::core::permission::{GrantPolicy, MemoryPermissionBackend, PermissionGate};
use clash_switchboard_lib::core::proxy::{MemoryProxyBackend, ProxyController};
use clash_switchboard_lib::core::store::{ConfigStore, MemoryStorageArea, Profile};
use clash_switchboard_lib::events::MemoryEventBus;

use super::test_env::init_test_env;

/// Fixed clock value stamped into `last_used` by the harness.
pub const FIXED_NOW: u64 = 1_700_000_000_000;

pub struct Harness {
    pub orch: Orchestrator,
    pub store: ConfigStore,
    pub area: Arc<MemoryStorageArea>,
    pub proxy: Arc<MemoryProxyBackend>,
    pub perms: Arc<MemoryPermissionBackend>,
    pub bus: MemoryEventBus,
}

pub fn harness() -> Harness {
    harness_with(MemoryPermissionBackend::new(GrantPolicy::DenyAll))
}

pub fn harness_with(perms: MemoryPermissionBackend) -> Harness {
    init_test_env();
    let area = Arc::new(MemoryStorageArea::new());
    let store = ConfigStore::new(area.clone());
    let perms = Arc::new(perms);
    let proxy = Arc::new(MemoryProxyBackend::new());
    let bus = MemoryEventBus::new();
    let options = OrchestratorOptions {
        health_check_timeout_ms: 500,
        request_timeout_ms: 1000,
        clock: Arc::new(|| FIXED_NOW),
    };
    let orch = Orchestrator::new(
        store.clone(),
        PermissionGate::new(perms.clone()),
        ProxyController::new(proxy.clone()),
        options,
        Arc::new(bus.clone()),
    );
    Harness { orch, store, area, proxy, perms, bus }
}

/// A controller answering `/version` and `/configs`.
pub async fn mock_controller(mixed_port: u16, port: u16) -> MockServer {
    mock_controller_with_configs(json!({
        "port": port,
        "socks-port": 7892,
        "mixed-port": mixed_port,
        "mode": "rule",
        "allow-lan": false
    }))
    .await
}

/// Same as `mock_controller` but `/configs` returns `configs` verbatim.
pub async fn mock_controller_with_configs(configs: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.18.0", "premium": false})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/configs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(configs))
        .mount(&server)
        .await;
    server
}

/// A controller that fails every request with HTTP 500.
pub async fn broken_controller() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

/// A loopback port nothing listens on.
pub fn unreachable_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

pub fn profile_for(server: &MockServer, name: &str) -> Profile {
    Profile::new(name, "127.0.0.1", server.address().port())
}

pub fn unreachable_profile(name: &str) -> Profile {
    Profile::new(name, "127.0.0.1", unreachable_port())
}

/// Number of requests `server` has seen.
pub async fn hits(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}
