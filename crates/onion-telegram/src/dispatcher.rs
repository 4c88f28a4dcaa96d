//! Long polling update loop

use crate::api::TelegramApi;
use crate::commands::Command;
use crate::config::TelegramConfig;
use crate::error::{Result, TelegramError};
use crate::handlers::CommandHandler;
use crate::types::Update;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Receives updates and routes commands to the [`CommandHandler`]
///
/// Each update is handled to completion before the next poll; shutdown never
/// interrupts a handler.
pub struct Dispatcher {
    api: Arc<dyn TelegramApi>,
    handler: CommandHandler,
    config: TelegramConfig,
    offset: i64,
    bot_username: Option<String>,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(api: Arc<dyn TelegramApi>, handler: CommandHandler, config: &TelegramConfig) -> Self {
        Self {
            api,
            handler,
            config: config.clone(),
            offset: 0,
            bot_username: None,
        }
    }

    /// Next `update_id` to request
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Poll until `shutdown` completes
    ///
    /// A rejected token fails immediately, whether at startup or while
    /// polling. Other errors, including on the initial `getMe`, are retried
    /// with capped exponential backoff. Shutdown is observed while waiting
    /// on the API and while backing off.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        let mut failures: u32 = 0;
        let me = loop {
            let attempt = tokio::select! {
                biased;
                () = &mut shutdown => return Ok(()),
                attempt = self.api.get_me() => attempt,
            };

            match attempt {
                Ok(me) => break me,
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, "bot identity rejected");
                    return Err(e);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry_delay(&e, failures);
                    warn!(error = %e, failures, ?delay, "getMe failed, backing off");

                    tokio::select! {
                        biased;
                        () = &mut shutdown => return Ok(()),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        };
        info!(bot = ?me.username, id = me.id, "bot started");
        self.bot_username = me.username;

        failures = 0;
        loop {
            let polled = tokio::select! {
                biased;
                () = &mut shutdown => break,
                polled = self.api.get_updates(self.offset, self.config.poll_timeout) => polled,
            };

            match polled {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        self.process_update(update).await;
                    }
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, "polling stopped");
                    return Err(e);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry_delay(&e, failures);
                    warn!(error = %e, failures, ?delay, "polling failed, backing off");

                    tokio::select! {
                        biased;
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(offset = self.offset, "bot stopped");
        Ok(())
    }

    /// Delay before retrying after `failures` consecutive errors
    fn retry_delay(&self, error: &TelegramError, failures: u32) -> Duration {
        match error {
            TelegramError::RateLimited { retry_after } => Duration::from_secs(*retry_after),
            _ => self.config.backoff(failures),
        }
    }

    /// Handle a single update and advance the offset past it
    ///
    /// A failed reply is logged; it does not stop the dispatcher.
    pub async fn process_update(&mut self, update: Update) {
        self.offset = self.offset.max(update.update_id + 1);

        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "ignoring non-message update");
            return;
        };
        let Some(command) = message
            .text
            .as_deref()
            .and_then(|text| Command::parse(text, self.bot_username.as_deref()))
        else {
            return;
        };

        debug!(command = command.name(), chat_id = message.chat.id, "handling command");
        let reply = self.handler.handle(command, &message).await;

        if let Err(e) = self.api.send_message(message.chat.id, &reply).await {
            warn!(error = %e, chat_id = message.chat.id, command = command.name(), "failed to send reply");
        }
    }
}
