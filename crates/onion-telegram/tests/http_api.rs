//! HttpTelegramApi against a local fake Bot API

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use onion_telegram::{HttpTelegramApi, TelegramApi, TelegramConfig, TelegramError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, String, Value)>>>,
}

async fn bot_method(
    State(recorded): State<Recorded>,
    Path((bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    recorded
        .calls
        .lock()
        .unwrap()
        .push((bot.clone(), method.clone(), body.clone()));

    if bot != "bot123:good" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"})),
        );
    }

    match method.as_str() {
        "getMe" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": {"id": 1, "is_bot": true, "first_name": "Onion AI", "username": "OnionAIBot"}})),
        ),
        "getUpdates" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": [
                {"update_id": body["offset"], "message": {
                    "message_id": 1,
                    "from": {"id": 42, "is_bot": false, "first_name": "Léa", "language_code": "fr-FR"},
                    "chat": {"id": 42, "type": "private"},
                    "date": 1_700_000_000,
                    "text": "/start"
                }}
            ]})),
        ),
        "sendMessage" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": {
                "message_id": 2,
                "chat": {"id": body["chat_id"], "type": "private"},
                "date": 1_700_000_001,
                "text": body["text"]
            }})),
        ),
        _ => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"ok": false, "error_code": 429, "description": "Too Many Requests", "parameters": {"retry_after": 3}})),
        ),
    }
}

async fn spawn_fake_api() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/{bot}/{method}", post(bot_method))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), recorded)
}

fn config(base: &str, token: &str) -> TelegramConfig {
    TelegramConfig::new(token)
        .with_api_base(base)
        .with_poll_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn get_me_returns_bot_identity() {
    let (base, _) = spawn_fake_api().await;
    let api = HttpTelegramApi::new(&config(&base, "123:good")).unwrap();

    let me = api.get_me().await.unwrap();
    assert_eq!(me.id, 1);
    assert_eq!(me.username.as_deref(), Some("OnionAIBot"));
}

#[tokio::test]
async fn get_updates_sends_offset_and_timeout() {
    let (base, recorded) = spawn_fake_api().await;
    let api = HttpTelegramApi::new(&config(&base, "123:good")).unwrap();

    let updates = api.get_updates(77, Duration::from_secs(1)).await.unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].update_id, 77);

    let message = updates[0].message.as_ref().unwrap();
    let user = message.from.as_ref().unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Léa"));
    assert_eq!(user.language_code.as_deref(), Some("fr-FR"));

    let calls = recorded.calls.lock().unwrap();
    let (_, method, body) = calls.last().unwrap();
    assert_eq!(method, "getUpdates");
    assert_eq!(body, &json!({"offset": 77, "timeout": 1}));
}

#[tokio::test]
async fn send_message_posts_chat_and_text() {
    let (base, recorded) = spawn_fake_api().await;
    let api = HttpTelegramApi::new(&config(&base, "123:good")).unwrap();

    let sent = api.send_message(42, "Ciao 🧅").await.unwrap();
    assert_eq!(sent.chat.id, 42);
    assert_eq!(sent.text.as_deref(), Some("Ciao 🧅"));

    let calls = recorded.calls.lock().unwrap();
    let (_, method, body) = calls.last().unwrap();
    assert_eq!(method, "sendMessage");
    assert_eq!(body, &json!({"chat_id": 42, "text": "Ciao 🧅"}));
}

#[tokio::test]
async fn rejected_token_maps_to_unauthorized() {
    let (base, _) = spawn_fake_api().await;
    let api = HttpTelegramApi::new(&config(&base, "123:bad")).unwrap();

    let err = api.get_me().await.unwrap_err();
    assert!(matches!(err, TelegramError::Unauthorized));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn http_errors_do_not_leak_the_token() {
    // Nothing listens on this port once the listener is dropped
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpTelegramApi::new(&config(&format!("http://{addr}"), "123:supersecret")).unwrap();
    let err = api.get_me().await.unwrap_err();

    assert!(matches!(err, TelegramError::Http(_)));
    assert!(!err.to_string().contains("supersecret"));
}
