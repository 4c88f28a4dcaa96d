//! Shared utilities for onion-bot
//!
//! This crate provides common functionality used across the onion-bot
//! workspace: tracing setup and the configuration shared by the bot and the
//! tracking service.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{LogFormat, init_tracing};
