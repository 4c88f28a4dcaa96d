//! Telegram front end for onion-bot
//!
//! The bot understands two commands:
//!
//! - `/start`: logs a [`onion_core::StartEvent`], counts the user's country
//!   and replies with the welcome message
//! - `/help`: replies with the command list
//!
//! Updates are received by long polling `getUpdates`. Everything else the
//! Bot API sends is acknowledged and ignored.
//!
//! # Example
//!
//! ```rust,ignore
//! use onion_telegram::{CommandHandler, Dispatcher, HttpTelegramApi, TelegramConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TelegramConfig::from_lookup(|key| std::env::var(key).ok())?;
//!     let api = Arc::new(HttpTelegramApi::new(&config)?);
//!     let handler = CommandHandler::new(starts, tracker, "www.oaibot.net");
//!
//!     Dispatcher::new(api, handler, &config)
//!         .run(async { tokio::signal::ctrl_c().await.ok(); })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod types;

pub use api::{HttpTelegramApi, TelegramApi};
pub use commands::Command;
pub use config::TelegramConfig;
pub use dispatcher::Dispatcher;
pub use error::{Result, TelegramError};
pub use handlers::CommandHandler;
pub use types::{Chat, Message, Update, User};
