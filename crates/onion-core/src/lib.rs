//! Visitor event logging and aggregation for onion-bot
//!
//! This crate holds the pieces of onion-bot that own data on disk:
//!
//! - [`EventLog`]: append-only JSON Lines log of visit and start events
//! - [`CountryTracker`]: the running per-country `/start` summary document
//! - [`country`]: language tag to country classification
//! - [`StartEvent`]: the record written for every `/start` command
//!
//! Both the Telegram front end and the HTTP tracking service build on these
//! types; they share nothing else at runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use onion_core::{CountryTracker, EventLog, StartEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let starts = EventLog::new("tracking_data/bot_starts.jsonl");
//!     let tracker = CountryTracker::new("tracking_data/country_stats.json");
//!
//!     let event = StartEvent::builder()
//!         .user_id(42)
//!         .language_code("it-IT")
//!         .build();
//!
//!     starts.append_event(&event).await;
//!     tracker.record_country(&event.country).await;
//! }
//! ```

pub mod country;
pub mod error;
pub mod event;
pub mod event_log;
pub mod stats;

pub use country::{UNKNOWN_COUNTRY, classify};
pub use error::{Result, TrackingError};
pub use event::{StartEvent, StartEventBuilder, local_timestamp};
pub use event_log::{EventLog, Record, SERVER_TIMESTAMP_FIELD};
pub use stats::{CountryStats, CountryTracker};
