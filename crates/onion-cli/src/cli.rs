//! Command-line arguments
//!
//! Flags are layered over the environment: each flag shadows the variable
//! named in its help, and the library config constructors read the result.
//! Defaults and validation live only in those constructors.

use clap::{Args, Parser, Subcommand};
use onion_telegram::{TelegramConfig, TelegramError};
use onion_tracker::{ServerConfig, TrackerError};
use onion_utils::{Config, ConfigError};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "onion-bot", version)]
#[command(about = "Onion AI Telegram bot and website visitor tracker", long_about = None)]
pub struct Cli {
    /// Directory holding the visitor log, start log and country stats [env: ONION_DATA_DIR]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Website advertised in bot replies [env: ONION_WEBSITE_URL]
    #[arg(long, global = true)]
    pub website_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Telegram bot
    Bot(BotArgs),

    /// Run the HTTP tracking server
    Serve(ServeArgs),

    /// Run the bot and the tracking server in one process
    Run {
        #[command(flatten)]
        bot: BotArgs,

        #[command(flatten)]
        serve: ServeArgs,
    },

    /// Print the per-country start statistics
    Stats,
}

#[derive(Args, Clone)]
pub struct BotArgs {
    /// Bot token from BotFather [env: TELEGRAM_BOT_TOKEN]
    #[arg(long)]
    pub token: Option<String>,

    /// Bot API base URL [env: TELEGRAM_API_BASE]
    #[arg(long)]
    pub api_base: Option<String>,

    /// Long poll timeout in seconds [env: TELEGRAM_POLL_TIMEOUT]
    #[arg(long)]
    pub poll_timeout: Option<u64>,
}

impl BotArgs {
    pub fn telegram_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<TelegramConfig, TelegramError> {
        TelegramConfig::from_lookup(|key| {
            let flag = match key {
                "TELEGRAM_BOT_TOKEN" => self.token.clone(),
                "TELEGRAM_API_BASE" => self.api_base.clone(),
                "TELEGRAM_POLL_TIMEOUT" => self.poll_timeout.map(|secs| secs.to_string()),
                _ => None,
            };
            flag.or_else(|| env(key))
        })
    }
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address the tracking server listens on [env: TRACKING_BIND_ADDR]
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn server_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ServerConfig, TrackerError> {
        let config = ServerConfig::from_lookup(env)?;
        Ok(match self.bind {
            Some(addr) => config.with_bind_addr(addr),
            None => config,
        })
    }
}

impl Cli {
    /// Shared configuration with flag overrides applied
    pub fn config(&self, env: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let mut config = Config::from_lookup(env)?;
        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(url) = &self.website_url {
            config.website_url.clone_from(url);
        }
        config.validate()?;
        Ok(config)
    }
}

/// The process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
