//! Error types for the Telegram front end

use thiserror::Error;

/// Telegram specific errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] onion_utils::ConfigError),

    /// Network or HTTP error
    ///
    /// The request URL is stripped before wrapping since it embeds the token.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The Bot API rejected the token
    #[error("Unauthorized: the bot token was rejected")]
    Unauthorized,

    /// Too many requests; the API asks to wait before retrying
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Any other error reported by the Bot API
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered `ok` without a result
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl TelegramError {
    /// Whether polling should keep going after this error
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unauthorized | Self::Config(_))
    }
}

/// Result type alias for Telegram operations
pub type Result<T> = std::result::Result<T, TelegramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Telegram API error 400: Bad Request: chat not found"
        );

        let err = TelegramError::Config(onion_utils::ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
        assert_eq!(
            err.to_string(),
            "Configuration error: TELEGRAM_BOT_TOKEN not set"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(!TelegramError::Unauthorized.is_retryable());
        assert!(TelegramError::RateLimited { retry_after: 3 }.is_retryable());
        assert!(
            TelegramError::Api {
                code: 409,
                description: "Conflict".to_string()
            }
            .is_retryable()
        );
    }
}
