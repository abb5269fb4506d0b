//! Authentication probe against a simulated hub

use std::time::Duration;

use homey_transport::{AuthSession, ClientConfig, HomeyError, build_http_client};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer, timeout: Duration) -> AuthSession {
    let config = ClientConfig::new(server.uri(), "test-token").with_timeout(timeout);
    let http = build_http_client(&config).unwrap();
    AuthSession::with_client(&config, http).unwrap()
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_validation_happens_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for token in ["", "   ", "\n\t"] {
        assert!(matches!(
            AuthSession::new(server.uri(), token),
            Err(HomeyError::Validation(_))
        ));
    }
    assert!(matches!(
        AuthSession::new(server.uri().replace("http://", "ws://"), "test-token"),
        Err(HomeyError::Validation(_))
    ));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ============================================================================
// Probe outcomes
// ============================================================================

#[tokio::test]
async fn test_success_stores_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/manager/system"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "MyHub"})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = session_for(&server, Duration::from_secs(5));
    let session = auth.authenticate().await.unwrap();

    assert!(session.authenticated);
    assert!(auth.is_authenticated());
    assert_eq!(serde_json::Value::Object(session.metadata), json!({"name": "MyHub"}));
    assert_eq!(auth.metadata().get("name"), Some(&json!("MyHub")));
}

#[tokio::test]
async fn test_unauthorized_and_forbidden() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/manager/system"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let auth = session_for(&server, Duration::from_secs(5));
        match auth.authenticate().await {
            Err(HomeyError::Authentication { status: got, .. }) => assert_eq!(got, Some(status)),
            other => panic!("expected authentication error for {status}, got {other:?}"),
        }
        assert!(!auth.is_authenticated());
    }
}

#[tokio::test]
async fn test_other_status_carries_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/manager/system"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let auth = session_for(&server, Duration::from_secs(5));
    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, HomeyError::Authentication { status: Some(503), .. }));
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn test_timeout_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/manager/system"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let auth = session_for(&server, Duration::from_millis(100));
    assert!(matches!(
        auth.authenticate().await,
        Err(HomeyError::Connection(_))
    ));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(format!("http://{}", addr), "test-token")
        .with_timeout(Duration::from_secs(2));
    let auth = AuthSession::with_client(&config, build_http_client(&config).unwrap()).unwrap();

    assert!(matches!(
        auth.authenticate().await,
        Err(HomeyError::Connection(_))
    ));
}

#[tokio::test]
async fn test_non_object_body_keeps_empty_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/manager/system"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let auth = session_for(&server, Duration::from_secs(5));
    let session = auth.authenticate().await.unwrap();
    assert!(session.authenticated);
    assert!(session.metadata.is_empty());
}
