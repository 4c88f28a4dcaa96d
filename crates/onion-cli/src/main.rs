//! Onion AI bot and visitor tracker
//!
//! # Usage
//!
//! ```bash
//! export TELEGRAM_BOT_TOKEN="123456:ABC..."
//!
//! # Bot and tracking server together
//! onion-bot run
//!
//! # Or separately
//! onion-bot bot
//! onion-bot serve --bind 0.0.0.0:8080
//!
//! # Country statistics collected so far
//! onion-bot stats
//! ```

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{BotArgs, Cli, Command, ServeArgs, process_env};
use onion_core::{CountryTracker, EventLog};
use onion_telegram::{CommandHandler, Dispatcher, HttpTelegramApi};
use onion_tracker::TrackingServer;
use onion_utils::{Config, LogFormat, init_tracing};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};

const DEFAULT_LOG_DIRECTIVE: &str =
    "warn,onion_core=info,onion_telegram=info,onion_tracker=info,onion_bot=info";

/// Files shared by the bot and the tracking server
struct Stores {
    visits: Arc<EventLog>,
    starts: Arc<EventLog>,
    tracker: Arc<CountryTracker>,
}

impl Stores {
    fn open(config: &Config) -> Self {
        Self {
            visits: Arc::new(
                EventLog::new(config.visitor_log_path())
                    .with_span(info_span!("event_log", log = "visitors")),
            ),
            starts: Arc::new(
                EventLog::new(config.start_log_path())
                    .with_span(info_span!("event_log", log = "bot_starts")),
            ),
            tracker: Arc::new(CountryTracker::new(config.country_stats_path())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(DEFAULT_LOG_DIRECTIVE, LogFormat::from_env());

    let config = cli.config(process_env).context("invalid configuration")?;
    let stores = Stores::open(&config);
    info!(
        environment = %config.environment,
        data_dir = %config.data_dir().display(),
        website = %config.website_url,
        "onion-bot starting"
    );

    match cli.command {
        Command::Bot(bot) => run_bot(&config, &bot, &stores, stopped(shutdown_signal())).await,
        Command::Serve(serve) => run_server(&serve, &stores, stopped(shutdown_signal())).await,
        Command::Run { bot, serve } => run_both(&config, bot, serve, stores).await,
        Command::Stats => print_stats(&stores).await,
    }
}

async fn run_bot(
    config: &Config,
    args: &BotArgs,
    stores: &Stores,
    shutdown: impl Future<Output = ()> + Send,
) -> anyhow::Result<()> {
    let telegram = args
        .telegram_config(process_env)
        .context("invalid Telegram configuration")?;
    let api = HttpTelegramApi::new(&telegram).context("failed to build Telegram client")?;
    let handler = CommandHandler::new(
        stores.starts.clone(),
        stores.tracker.clone(),
        config.website_url.clone(),
    );

    Dispatcher::new(Arc::new(api), handler, &telegram)
        .run(shutdown)
        .await
        .context("bot stopped")
}

async fn run_server(
    args: &ServeArgs,
    stores: &Stores,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let config = args
        .server_config(process_env)
        .context("invalid tracking server configuration")?;
    let span = info_span!("tracking_server", bind = %config.bind_addr);
    TrackingServer::new(config, stores.visits.clone())
        .with_span(span)
        .run(shutdown)
        .await
        .context("tracking server stopped")
}

/// Bot and server as two tasks; the first failure ends the process
async fn run_both(
    config: &Config,
    bot: BotArgs,
    serve: ServeArgs,
    stores: Stores,
) -> anyhow::Result<()> {
    let stop = shutdown_signal();
    let stores = Arc::new(stores);

    let bot_task: JoinHandle<anyhow::Result<()>> = tokio::spawn({
        let config = config.clone();
        let stores = stores.clone();
        let shutdown = stopped(stop.clone());
        async move { run_bot(&config, &bot, &stores, shutdown).await }
    });
    let server_task: JoinHandle<anyhow::Result<()>> = tokio::spawn({
        let stores = stores.clone();
        async move { run_server(&serve, &stores, stopped(stop)).await }
    });

    tokio::try_join!(joined(bot_task, "bot"), joined(server_task, "server"))?;
    Ok(())
}

async fn joined(task: JoinHandle<anyhow::Result<()>>, name: &str) -> anyhow::Result<()> {
    task.await
        .with_context(|| format!("{name} task panicked"))?
}

async fn print_stats(stores: &Stores) -> anyhow::Result<()> {
    let stats = stores
        .tracker
        .snapshot()
        .await
        .context("failed to read country stats")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Flips to `true` on Ctrl-C
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            // Keep the sender alive so receivers never observe a shutdown
            std::future::pending::<()>().await;
        }
        info!("received Ctrl-C, shutting down");
        let _ = tx.send(true);
    });
    rx
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
