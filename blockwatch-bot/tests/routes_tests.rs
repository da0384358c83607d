use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use blockwatch_bot::{RateLimitConfig, create_app};
use blockwatch_core::{
    DeliveryError, Engine, MessageGateway, MessageId, ServerKey, StatusResult, SubscriberId,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
// for `oneshot` method

/// Gateway that accepts every message
#[derive(Default)]
struct AcceptingGateway {
    next_id: AtomicU64,
}

#[async_trait]
impl MessageGateway for AcceptingGateway {
    async fn send_message(
        &self,
        _to: SubscriberId,
        _text: &str,
        _silent: bool,
    ) -> Result<MessageId, DeliveryError> {
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn delete_message(
        &self,
        _to: SubscriberId,
        _message: MessageId,
    ) -> Result<(), DeliveryError> {
        Ok(())
    }
}

fn setup_engine() -> Arc<Engine> {
    Arc::new(Engine::new(Arc::new(AcceptingGateway::default())))
}

fn create_test_app(engine: Arc<Engine>) -> axum::Router {
    create_app(engine, Duration::from_secs(30), RateLimitConfig::default())
}

/// Helper to send a GET request and get the JSON response
async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        // The rate limiter keys on client IP
        .header("X-Forwarded-For", "127.0.0.1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };
    (status, json)
}

fn key(s: &str) -> ServerKey {
    ServerKey::parse(s).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = create_test_app(setup_engine());
    let (status, _body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_servers_empty() {
    let app = create_test_app(setup_engine());
    let (status, body) = get(app, "/servers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_servers_lists_tracked_servers_with_status() {
    // GIVEN: two tracked servers, one with a notified status
    let engine = setup_engine();
    let survival = key("survival.example.com");
    let creative = key("creative.example.com:25570");
    engine.subscribe(&survival, SubscriberId(1)).await.unwrap();
    engine.subscribe(&survival, SubscriberId(2)).await.unwrap();
    engine.subscribe(&creative, SubscriberId(1)).await.unwrap();
    engine
        .handle_probe_result(
            &survival,
            Ok(StatusResult {
                online: 2,
                max: 20,
                sample: vec!["Steve".to_string(), "Alex".to_string()],
            }),
            1_700_000_000,
        )
        .await;

    // WHEN: listing servers
    let (status, body) = get(create_test_app(engine), "/servers").await;

    // THEN: both are listed, sorted by key
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "server": "creative.example.com:25570",
                "subscribers": 1,
                "online": null,
                "players": null
            },
            {
                "server": "survival.example.com",
                "subscribers": 2,
                "online": "2/20",
                "players": "Alex, Steve"
            }
        ])
    );
}

#[tokio::test]
async fn test_single_server() {
    let engine = setup_engine();
    engine
        .subscribe(&key("play.example.com"), SubscriberId(5))
        .await
        .unwrap();

    let (status, body) = get(create_test_app(engine), "/servers/Play.Example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["server"], "play.example.com");
    assert_eq!(body["subscribers"], 1);
}

#[tokio::test]
async fn test_untracked_server_is_not_found() {
    let (status, body) = get(create_test_app(setup_engine()), "/servers/nowhere.example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Server is not tracked");
    assert_eq!(body["details"], "nowhere.example.com");
}

#[tokio::test]
async fn test_malformed_server_is_bad_request() {
    let (status, body) = get(create_test_app(setup_engine()), "/servers/bad!host:99999999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("port"));
}

#[tokio::test]
async fn test_unsubscribed_server_disappears() {
    let engine = setup_engine();
    let server = key("play.example.com");
    engine.subscribe(&server, SubscriberId(5)).await.unwrap();
    engine.unsubscribe_all(SubscriberId(5)).await;

    let (status, _body) = get(create_test_app(engine), "/servers/play.example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
