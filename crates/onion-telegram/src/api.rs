//! Bot API client
//!
//! [`TelegramApi`] is the seam between the dispatcher and the network;
//! [`HttpTelegramApi`] implements it over HTTPS with reqwest.
//! See: https://core.telegram.org/bots/api#making-requests

use crate::config::TelegramConfig;
use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, Message, Update, User};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// Extra time allowed on top of the long poll timeout before the HTTP
/// request itself times out
const REQUEST_GRACE: Duration = Duration::from_secs(10);

/// Bot API operations used by the dispatcher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Identity of the bot owning the token
    async fn get_me(&self) -> Result<User>;

    /// Long poll for updates with `update_id >= offset`
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>>;

    /// Send a plain text message
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message>;
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Bot API client over HTTPS
pub struct HttpTelegramApi {
    client: Client,
    method_base: String,
}

impl HttpTelegramApi {
    /// Create a client for the bot described by `config`
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.poll_timeout + REQUEST_GRACE)
            .build()?;

        Ok(Self {
            client,
            method_base: config.method_base(),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.method_base))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(method, %status, bytes = text.len(), "bot api response");

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                TelegramError::Json(e)
            } else {
                TelegramError::Api {
                    code: i64::from(status.as_u16()),
                    description: text.chars().take(200).collect(),
                }
            }
        })?;

        into_result(envelope, i64::from(status.as_u16()))
    }
}

/// Unwrap a Bot API envelope, classifying failures
fn into_result<T>(envelope: ApiResponse<T>, http_status: i64) -> Result<T> {
    if envelope.ok {
        return envelope.result.ok_or_else(|| {
            TelegramError::UnexpectedResponse("ok response without result".to_string())
        });
    }

    let code = envelope.error_code.unwrap_or(http_status);
    let description = envelope
        .description
        .unwrap_or_else(|| "no description".to_string());

    Err(match code {
        401 => TelegramError::Unauthorized,
        429 => TelegramError::RateLimited {
            retry_after: envelope
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1),
        },
        _ => TelegramError::Api { code, description },
    })
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    #[instrument(skip(self))]
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    #[instrument(skip(self))]
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
        };
        self.call("getUpdates", &request).await
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let request = SendMessageRequest { chat_id, text };
        self.call("sendMessage", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ApiResponse<serde_json::Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_result_ok() {
        let result = into_result(envelope(r#"{"ok": true, "result": [1, 2]}"#), 200).unwrap();
        assert_eq!(result, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_into_result_missing_result() {
        let err = into_result(envelope(r#"{"ok": true}"#), 200).unwrap_err();
        assert!(matches!(err, TelegramError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_into_result_classifies_errors() {
        let err = into_result(
            envelope(r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#),
            401,
        )
        .unwrap_err();
        assert!(matches!(err, TelegramError::Unauthorized));

        let err = into_result(
            envelope(r#"{"ok": false, "error_code": 429, "parameters": {"retry_after": 7}}"#),
            429,
        )
        .unwrap_err();
        assert!(matches!(err, TelegramError::RateLimited { retry_after: 7 }));

        let err = into_result(
            envelope(r#"{"ok": false, "description": "Conflict: terminated by other getUpdates request"}"#),
            409,
        )
        .unwrap_err();
        assert!(matches!(err, TelegramError::Api { code: 409, .. }));
    }
}
