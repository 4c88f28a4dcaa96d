//! Configuration shared by the bot and the tracking service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "tracking_data";
const DEFAULT_WEBSITE_URL: &str = "www.oaibot.net";

const VISITOR_LOG_FILE: &str = "visitors.jsonl";
const START_LOG_FILE: &str = "bot_starts.jsonl";
const COUNTRY_STATS_FILE: &str = "country_stats.json";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("{0} not set")]
    Missing(&'static str),

    /// A setting is present but unusable
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Directory holding the visitor log, start log and stats document
    pub data_dir: PathBuf,
    /// Website advertised in bot replies
    pub website_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "onion-bot".to_string(),
            environment: "development".to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            website_url: DEFAULT_WEBSITE_URL.to_string(),
        }
    }
}

impl Config {
    /// Create a builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from an arbitrary key lookup
    ///
    /// Reads `ONION_ENV`, `ONION_DATA_DIR` and `ONION_WEBSITE_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(env) = lookup("ONION_ENV") {
            builder = builder.environment(env);
        }
        if let Some(dir) = lookup("ONION_DATA_DIR") {
            builder = builder.data_dir(dir);
        }
        if let Some(url) = lookup("ONION_WEBSITE_URL") {
            builder = builder.website_url(url);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                name: "ONION_DATA_DIR",
                reason: "must not be empty".to_string(),
            });
        }
        if self.website_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "ONION_WEBSITE_URL",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// JSON Lines log of website visits
    pub fn visitor_log_path(&self) -> PathBuf {
        self.data_dir.join(VISITOR_LOG_FILE)
    }

    /// JSON Lines log of `/start` commands
    pub fn start_log_path(&self) -> PathBuf {
        self.data_dir.join(START_LOG_FILE)
    }

    /// Per-country stats document
    pub fn country_stats_path(&self) -> PathBuf {
        self.data_dir.join(COUNTRY_STATS_FILE)
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    app_name: Option<String>,
    environment: Option<String>,
    data_dir: Option<PathBuf>,
    website_url: Option<String>,
}

impl ConfigBuilder {
    /// Set application name
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set environment
    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }

    /// Set data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set website URL
    pub fn website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            app_name: self.app_name.unwrap_or(defaults.app_name),
            environment: self.environment.unwrap_or(defaults.environment),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            website_url: self.website_url.unwrap_or(defaults.website_url),
        };

        config.validate()?;
        Ok(config)
    }
}
