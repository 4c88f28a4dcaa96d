//! Command handlers
//!
//! Handlers produce the reply text. Recording a start is a side effect that
//! may fail; the reply is the same either way.

use crate::commands::{Command, help_text, welcome_text};
use crate::types::Message;
use onion_core::{CountryTracker, EventLog, StartEvent};
use std::sync::Arc;
use tracing::{info, warn};

/// Handles `/start` and `/help`
pub struct CommandHandler {
    starts: Arc<EventLog>,
    tracker: Arc<CountryTracker>,
    website_url: String,
}

impl CommandHandler {
    /// Create a handler logging starts to `starts` and counting countries in
    /// `tracker`
    pub fn new(
        starts: Arc<EventLog>,
        tracker: Arc<CountryTracker>,
        website_url: impl Into<String>,
    ) -> Self {
        Self {
            starts,
            tracker,
            website_url: website_url.into(),
        }
    }

    /// Produce the reply for `command` sent in `message`
    pub async fn handle(&self, command: Command, message: &Message) -> String {
        match command {
            Command::Start => self.handle_start(message).await,
            Command::Help => self.handle_help(),
        }
    }

    /// Record the start, then return the welcome text
    pub async fn handle_start(&self, message: &Message) -> String {
        let event = start_event(message);

        let logged = self.starts.append_event(&event).await;
        let stats = self.tracker.record_country(&event.country).await;

        if logged && stats.is_some() {
            info!(
                user_id = ?event.user_id,
                country = %event.country,
                "start recorded"
            );
        } else {
            warn!(
                user_id = ?event.user_id,
                logged,
                counted = stats.is_some(),
                "start only partially recorded"
            );
        }

        welcome_text(&self.website_url)
    }

    /// Return the help text
    pub fn handle_help(&self) -> String {
        help_text(&self.website_url)
    }
}

/// Build the start event for a `/start` message
pub fn start_event(message: &Message) -> StartEvent {
    let mut builder = StartEvent::builder()
        .chat_id(message.chat.id)
        .chat_type(message.chat.kind.clone());

    if let Some(user) = &message.from {
        builder = builder
            .user_id(user.id)
            .username(user.username.clone())
            .first_name(user.first_name.clone())
            .last_name(user.last_name.clone());
        if let Some(language_code) = &user.language_code {
            builder = builder.language_code(language_code.clone());
        }
    }

    builder.build()
}
