mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clash_switchboard_lib::core::controller::{
    ConfigPatch, ControllerClient, ControllerError, ProxyGroupType, RunMode,
};

fn client_for(server: &MockServer, secret: Option<&str>) -> ControllerClient {
    ControllerClient::new("127.0.0.1", server.address().port(), secret).with_request_timeout(1000)
}

#[tokio::test]
async fn test_version_sends_bearer_when_secret_set() {
    common::test_env::init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "v1.18.1", "meta": true})))
        .expect(1)
        .mount(&server)
        .await;

    let v = client_for(&server, Some("s3cret")).get_version().await.unwrap();
    assert_eq!(v.version, "v1.18.1");
    assert_eq!(v.meta, Some(true));
    assert!(!v.premium);
}

#[tokio::test]
async fn test_no_authorization_header_without_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1"})))
        .mount(&server)
        .await;

    client_for(&server, Some("")).get_version().await.unwrap();
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[0].headers.get("content-type").map(|v| v.to_str().unwrap()),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_api_error_prefers_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxies/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Resource not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/configs"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.get_proxy("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Resource not found");
    assert_eq!(err.status(), Some(404));

    let err = client.get_config().await.unwrap_err();
    assert_eq!(err.to_string(), "Bad Gateway");
    assert_eq!(err.category(), "api");
}

#[tokio::test]
async fn test_health_check_false_on_http_500() {
    let server = common::fixtures::broken_controller().await;
    assert!(!client_for(&server, None).health_check(1000).await);
}

#[tokio::test]
async fn test_health_check_true_and_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1"})))
        .mount(&server)
        .await;
    assert!(client_for(&server, None).health_check(1000).await);

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"version": "1"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&slow)
        .await;
    assert!(!client_for(&slow, None).health_check(100).await);
}

#[tokio::test]
async fn test_request_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"rules": []}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;
    let client = ControllerClient::new("127.0.0.1", server.address().port(), None).with_request_timeout(100);
    let err = client.get_rules().await.unwrap_err();
    assert!(matches!(err, ControllerError::Timeout(100)), "got {err:?}");
}

#[tokio::test]
async fn test_switch_proxy_escapes_group_name() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/proxies/Proxy%20Group"))
        .and(body_json(json!({"name": "Node A"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, None).switch_proxy("Proxy Group", "Node A").await.unwrap();
}

#[tokio::test]
async fn test_patch_config_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/configs"))
        .and(body_json(json!({"mode": "global"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, None)
        .patch_config(&ConfigPatch::mode(RunMode::Global))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delay_queries_carry_url_and_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxies/HK%2001/delay"))
        .and(query_param("url", "http://www.gstatic.com/generate_204"))
        .and(query_param("timeout", "3000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"delay": 87})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/group/Auto/delay"))
        .and(query_param("timeout", "2000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"HK 01": 87, "JP 02": 140})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let d = client
        .test_proxy_delay("HK 01", "http://www.gstatic.com/generate_204", 3000)
        .await
        .unwrap();
    assert_eq!(d.delay, 87);

    let group = client
        .test_group_delay("Auto", "http://www.gstatic.com/generate_204", 2000)
        .await
        .unwrap();
    assert_eq!(group.get("JP 02"), Some(&140));
}

#[tokio::test]
async fn test_proxies_groups_and_latest_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "proxies": {
                "GLOBAL": {"name": "GLOBAL", "type": "Selector", "now": "Auto", "all": ["Auto", "HK 01"], "history": []},
                "Auto": {"name": "Auto", "type": "URLTest", "now": "HK 01", "all": ["HK 01"], "history": []},
                "Chain": {"name": "Chain", "type": "Relay", "all": ["HK 01"], "history": []},
                "HK 01": {"name": "HK 01", "type": "Shadowsocks", "udp": true,
                          "history": [{"time": "t1", "delay": 120}, {"time": "t2", "delay": 95}]}
            }
        })))
        .mount(&server)
        .await;

    let proxies = client_for(&server, None).get_proxies().await.unwrap();
    let names: Vec<&str> = proxies.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Auto", "GLOBAL"]);
    assert_eq!(proxies.proxies["Chain"].group_type(), Some(ProxyGroupType::Relay));
    assert!(proxies.proxies["Chain"].is_group());
    assert_eq!(proxies.proxies["HK 01"].latest_delay(), Some(95));
    assert!(!proxies.proxies["HK 01"].is_group());
}

#[tokio::test]
async fn test_connections_null_table_and_close() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloadTotal": 10, "uploadTotal": 5, "connections": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/connections/a%2Fb"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/connections"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let conns = client.get_connections().await.unwrap();
    assert!(conns.connections.is_empty());
    assert_eq!(conns.download_total, 10);
    client.close_connection("a/b").await.unwrap();
    client.close_all_connections().await.unwrap();
}

#[tokio::test]
async fn test_network_error_when_nothing_listens() {
    let port = common::fixtures::unreachable_port();
    let err = ControllerClient::new("127.0.0.1", port, None)
        .get_version()
        .await
        .unwrap_err();
    assert_eq!(err.category(), "network");
}
