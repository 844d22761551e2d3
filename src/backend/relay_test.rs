use mockito::Matcher;

use crate::models::Role;

use super::*;

async fn setup() -> (mockito::ServerGuard, Relay) {
    let server = mockito::Server::new_async().await;
    let relay = Relay::default().with_endpoint(&format!("{}/api/chat", server.url()));
    (server, relay)
}

#[tokio::test]
async fn test_complete() {
    let (mut server, relay) = setup().await;
    let handler = server
        .mock("POST", "/api/chat")
        .match_header("Content-Type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({
            "messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello!"},
                {"role": "user", "content": "How are you?"}
            ]
        })))
        .with_status(200)
        .with_body(r#"{"message": "Fine, thanks."}"#)
        .expect(1)
        .create_async()
        .await;

    let text = relay
        .complete(vec![
            ChatTurn::new(Role::User, "Hi"),
            ChatTurn::new(Role::Assistant, "Hello!"),
            ChatTurn::new(Role::User, "How are you?"),
        ])
        .await
        .expect("Failed to get completion");

    assert_eq!(text, "Fine, thanks.");
    handler.assert_async().await;
}

#[tokio::test]
async fn test_complete_error_status() {
    let cases = [
        (
            500,
            r#"{"error": "OpenAI API key is not configured"}"#,
            "OpenAI API key is not configured",
        ),
        (400, r#"{"message": "bad request"}"#, "bad request"),
        (503, "Service Unavailable", "HTTP error! status: 503"),
        (502, r#"{"error": ""}"#, "HTTP error! status: 502"),
    ];

    for (status, body, want) in cases {
        let (mut server, relay) = setup().await;
        let _handler = server
            .mock("POST", "/api/chat")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let err = relay
            .complete(vec![ChatTurn::new(Role::User, "Hi")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), want, "status {status}");
    }
}

#[tokio::test]
async fn test_complete_error_body_on_success_status() {
    let (mut server, relay) = setup().await;
    let _handler = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(r#"{"message": "", "error": "rate limited"}"#)
        .create_async()
        .await;

    let err = relay
        .complete(vec![ChatTurn::new(Role::User, "Hi")])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "rate limited");
}

#[tokio::test]
async fn test_complete_missing_message() {
    for body in [r#"{}"#, r#"{"message": "   "}"#] {
        let (mut server, relay) = setup().await;
        let _handler = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let err = relay
            .complete(vec![ChatTurn::new(Role::User, "Hi")])
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<RelayError>().is_some(), "body {body}");
    }
}

#[tokio::test]
async fn test_complete_malformed_body() {
    let (mut server, relay) = setup().await;
    let _handler = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body("definitely not json")
        .create_async()
        .await;

    let err = relay
        .complete(vec![ChatTurn::new(Role::User, "Hi")])
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("parsing chat response"));
}

#[tokio::test]
async fn test_complete_rejects_empty_history() {
    let relay = Relay::default().with_endpoint("http://127.0.0.1:1/api/chat");
    assert!(relay.complete(vec![]).await.is_err());
}
