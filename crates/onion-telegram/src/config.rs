//! Telegram bot configuration

use crate::error::Result;
use onion_utils::ConfigError;
use std::fmt;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram bot configuration
///
/// `Debug` output never includes the token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub token: String,

    /// Bot API base URL (default: "https://api.telegram.org")
    pub api_base: String,

    /// Long poll timeout passed to `getUpdates`
    pub poll_timeout: Duration,

    /// First delay after a failed poll
    pub initial_backoff: Duration,

    /// Upper bound for the delay between failed polls
    pub max_backoff: Duration,
}

impl TelegramConfig {
    /// Create a config with the given token and default settings
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Create config from an arbitrary key lookup
    ///
    /// Reads `TELEGRAM_BOT_TOKEN` (required), `TELEGRAM_API_BASE` and
    /// `TELEGRAM_POLL_TIMEOUT` (seconds).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let mut config = Self::new(token);

        if let Some(api_base) = lookup("TELEGRAM_API_BASE") {
            config = config.with_api_base(api_base);
        }

        if let Some(timeout) = lookup("TELEGRAM_POLL_TIMEOUT") {
            let secs = timeout.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "TELEGRAM_POLL_TIMEOUT",
                reason: e.to_string(),
            })?;
            config = config.with_poll_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the Bot API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the long poll timeout
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the error backoff bounds
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN").into());
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                name: "TELEGRAM_BOT_TOKEN",
                reason: "must not contain whitespace".to_string(),
            }
            .into());
        }
        if self.initial_backoff > self.max_backoff {
            return Err(ConfigError::Invalid {
                name: "backoff",
                reason: "initial backoff exceeds maximum".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Backoff before the poll following `failures` consecutive failures
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2_u32.saturating_pow(failures.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Base URL for methods of this bot, including the token
    pub(crate) fn method_base(&self) -> String {
        format!("{}/bot{}", self.api_base, self.token)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("poll_timeout", &self.poll_timeout)
            .field("initial_backoff", &self.initial_backoff)
            .field("max_backoff", &self.max_backoff)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelegramError;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = TelegramConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_API_BASE", "http://localhost:8081/"),
            ("TELEGRAM_POLL_TIMEOUT", "10"),
        ]))
        .unwrap();

        assert_eq!(config.token, "123:abc");
        assert_eq!(config.api_base, "http://localhost:8081");
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
        assert_eq!(config.method_base(), "http://localhost:8081/bot123:abc");
    }

    #[test]
    fn test_missing_token() {
        let err = TelegramConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            TelegramError::Config(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
        ));

        let err = TelegramConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, TelegramError::Config(_)));
    }

    #[test]
    fn test_invalid_poll_timeout() {
        let err = TelegramConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_POLL_TIMEOUT", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            TelegramError::Config(ConfigError::Invalid { name: "TELEGRAM_POLL_TIMEOUT", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = TelegramConfig::new("123:secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_backoff() {
        let config = TelegramConfig::new("t")
            .with_backoff(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
        assert_eq!(config.backoff(5), Duration::from_secs(10));
        assert_eq!(config.backoff(64), Duration::from_secs(10));
    }

    #[test]
    fn test_validation_backoff_order() {
        let config = TelegramConfig::new("t")
            .with_backoff(Duration::from_secs(10), Duration::from_secs(1));
        assert!(config.validate().is_err());
    }
}
