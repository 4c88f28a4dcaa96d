//! The record written for every `/start` command

use crate::country::classify;
use crate::error::{Result, TrackingError, json_type_name};
use crate::event_log::Record;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Current local time as an ISO-8601 timestamp without offset
///
/// Matches the format already present in existing log files, e.g.
/// `2025-03-14T09:26:53.589793`.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// A `/start` invocation, as stored in the start log
///
/// Optional fields serialize as `null` when the platform did not supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    /// When the command was handled
    pub timestamp: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub chat_id: Option<i64>,
    pub chat_type: Option<String>,
    /// Raw language tag reported by the client
    pub language_code: Option<String>,
    /// Country derived from `language_code`
    pub country: String,
}

impl StartEvent {
    /// Create a builder
    pub fn builder() -> StartEventBuilder {
        StartEventBuilder::default()
    }

    /// Convert into a flat record suitable for [`crate::EventLog::append`]
    pub fn to_record(&self) -> Result<Record> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(TrackingError::NotAnObject(json_type_name(&other))),
        }
    }
}

/// Builder for StartEvent
#[derive(Debug, Default)]
pub struct StartEventBuilder {
    timestamp: Option<String>,
    user_id: Option<i64>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    chat_id: Option<i64>,
    chat_type: Option<String>,
    language_code: Option<String>,
}

impl StartEventBuilder {
    /// Override the event timestamp (defaults to now)
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn username(mut self, username: Option<impl Into<String>>) -> Self {
        self.username = username.map(Into::into);
        self
    }

    pub fn first_name(mut self, first_name: Option<impl Into<String>>) -> Self {
        self.first_name = first_name.map(Into::into);
        self
    }

    pub fn last_name(mut self, last_name: Option<impl Into<String>>) -> Self {
        self.last_name = last_name.map(Into::into);
        self
    }

    pub fn chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn chat_type(mut self, chat_type: impl Into<String>) -> Self {
        self.chat_type = Some(chat_type.into());
        self
    }

    pub fn language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }

    /// Build the event, classifying the country from the language code
    pub fn build(self) -> StartEvent {
        let country = classify(self.language_code.as_deref()).to_string();
        StartEvent {
            timestamp: self.timestamp.unwrap_or_else(local_timestamp),
            user_id: self.user_id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            chat_id: self.chat_id,
            chat_type: self.chat_type,
            language_code: self.language_code,
            country,
        }
    }
}
