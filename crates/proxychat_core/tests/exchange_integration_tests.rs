//! Integration tests for the HTTP exchange path.
//!
//! These tests run the real HTTP exchanger against a local mock server,
//! alone and wired into a chat controller.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use proxychat_core::{
    ChatConfig, ChatController, ExchangeError, ExchangeRequest, HttpExchanger, IdentityStore,
    Identifiers, MemoryStore, SubmitOutcome, Turn, TurnExchanger, NO_REPLY_PLACEHOLDER,
};

fn identifiers() -> Identifiers {
    Identifiers {
        session_id: "session123".to_string(),
        user_id: "user456".to_string(),
    }
}

fn exchanger_for(server: &MockServer) -> HttpExchanger {
    HttpExchanger::from_config(&ChatConfig::default().with_endpoint(server.uri()))
}

/// Test the request body and the reply extraction.
#[tokio::test]
async fn test_http_exchange_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/proxy"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "data": { "message": { "role": "user", "content": "hello" } },
            "stateful": true,
            "stream": false,
            "user_id": "user456",
            "session_id": "session123",
            "verbose": false,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "output_data": { "content": "Hi!" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());
    let response = exchanger_for(&server).send(&request).await.unwrap();

    assert_eq!(response.content, "Hi!");
    assert!(!response.degraded);
}

/// Test that a non-success status is a server error carrying the status.
#[tokio::test]
async fn test_http_exchange_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/proxy"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());
    let result = exchanger_for(&server).send(&request).await;

    match result {
        Err(ExchangeError::Server { status, detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "upstream exploded");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

/// Test that an empty error body falls back to the status reason.
#[tokio::test]
async fn test_http_exchange_server_error_without_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());
    let result = exchanger_for(&server).send(&request).await;

    assert_eq!(
        result,
        Err(ExchangeError::Server {
            status: 404,
            detail: "Not Found".to_string(),
        })
    );
}

/// Test that a reply without output_data degrades to the placeholder.
#[tokio::test]
async fn test_http_exchange_missing_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());
    let response = exchanger_for(&server).send(&request).await.unwrap();

    assert!(response.degraded);
    assert_eq!(response.content, NO_REPLY_PLACEHOLDER);
}

/// Test that an unreadable success body is a transport error.
#[tokio::test]
async fn test_http_exchange_invalid_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());
    let result = exchanger_for(&server).send(&request).await;

    assert!(matches!(result, Err(ExchangeError::Transport(_))));
}

/// Test that an unreachable backend is a transport error.
#[tokio::test]
async fn test_http_exchange_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let exchanger = HttpExchanger::from_config(&ChatConfig::default().with_endpoint(uri));
    let request = ExchangeRequest::new(Turn::user("hello"), &identifiers());

    let result = exchanger.send(&request).await;
    assert!(matches!(result, Err(ExchangeError::Transport(_))));
}

/// Test a full submission through the controller over HTTP.
#[tokio::test]
async fn test_controller_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/proxy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "output_data": { "content": "**Welcome** back" } })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let identity = IdentityStore::new(
        Arc::new(MemoryStore::new().with_value("session_id", "session123")),
        Arc::new(MemoryStore::new()),
    );
    let config = ChatConfig::default().with_endpoint(server.uri());
    let controller = ChatController::from_config(
        &config,
        identity,
        Arc::new(HttpExchanger::from_config(&config)),
    );

    assert_eq!(
        controller.submit("hi").await,
        SubmitOutcome::Answered { degraded: false }
    );
    assert_eq!(
        controller.submit_prompt("How do I get started?").await,
        SubmitOutcome::Answered { degraded: false }
    );

    let view = controller.view();
    assert_eq!(view.conversation.len(), 4);
    assert_eq!(view.conversation.turns()[1], Turn::agent("**Welcome** back"));
    assert!(!view.is_loading);
    assert!(view.error.is_none());

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<serde_json::Value> = requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(bodies[0]["session_id"], "session123");
    assert_eq!(bodies[0]["user_id"], bodies[1]["user_id"]);
    assert_eq!(bodies[1]["data"]["message"]["content"], "How do I get started?");
}

/// Test that a failing backend leaves the unanswered turn and an error.
#[tokio::test]
async fn test_controller_over_http_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = ChatConfig::default().with_endpoint(server.uri());
    let controller = ChatController::from_config(
        &config,
        IdentityStore::in_memory(),
        Arc::new(HttpExchanger::from_config(&config)),
    );

    let outcome = controller.submit("hello").await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ExchangeError::Server { status: 502, .. })
    ));
    assert_eq!(controller.conversation().turns(), &[Turn::user("hello")]);
    assert!(controller.error().unwrap().contains("502"));
}
