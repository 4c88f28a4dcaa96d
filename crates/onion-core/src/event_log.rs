//! Append-only JSON Lines event log
//!
//! Every record is stamped with [`SERVER_TIMESTAMP_FIELD`] and written as one
//! line of UTF-8 JSON. Non-ASCII text is written as-is, never `\u` escaped.
//! Lines are only ever appended; nothing rewrites or truncates the file.

use crate::error::{Result, TrackingError};
use crate::event::{StartEvent, local_timestamp};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{Instrument, Span, debug, error, info_span};

/// A flat key/value event as written to the log
pub type Record = serde_json::Map<String, Value>;

/// Field added to every record at append time
pub const SERVER_TIMESTAMP_FIELD: &str = "server_timestamp";

/// Append-only log of visit or start events
///
/// Appends from within one process are serialized so a line is written by a
/// single `write` call and never interleaves with another. Other processes
/// writing the same file rely on append-mode semantics of the OS.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
    span: Span,
}

impl EventLog {
    /// Create a log backed by `path`; the file and its directory are created
    /// on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let span = info_span!("event_log", path = %path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
            span,
        }
    }

    /// Replace the span the log's operations are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, returning whether it reached the file
    ///
    /// Failures are logged and reported as `false`; they never propagate.
    pub async fn append(&self, record: Record) -> bool {
        match self.try_append(record).await {
            Ok(_) => true,
            Err(e) => {
                self.span.in_scope(|| error!(error = %e, "failed to append event"));
                false
            }
        }
    }

    /// Append a `/start` event
    pub async fn append_event(&self, event: &StartEvent) -> bool {
        match event.to_record() {
            Ok(record) => self.append(record).await,
            Err(e) => {
                self.span.in_scope(|| error!(error = %e, "failed to encode start event"));
                false
            }
        }
    }

    /// Append a record, returning the stamped record that was written
    pub async fn try_append(&self, mut record: Record) -> Result<Record> {
        record.insert(
            SERVER_TIMESTAMP_FIELD.to_string(),
            Value::String(local_timestamp()),
        );

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        async {
            let _guard = self.write_lock.lock().await;

            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TrackingError::io(parent, e))?;
            }

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| TrackingError::io(&self.path, e))?;

            file.write_all(line.as_bytes())
                .await
                .map_err(|e| TrackingError::io(&self.path, e))?;
            file.flush()
                .await
                .map_err(|e| TrackingError::io(&self.path, e))?;

            debug!(bytes = line.len(), "event appended");
            Ok::<_, TrackingError>(())
        }
        .instrument(self.span.clone())
        .await?;

        Ok(record)
    }

    /// Read every record in arrival order
    ///
    /// Returns `Ok(None)` when the log has not been created yet. Blank lines
    /// are skipped.
    pub async fn read_all(&self) -> Result<Option<Vec<Value>>> {
        let Some(contents) = self.read_contents().await? else {
            return Ok(None);
        };

        let lines: Vec<_> = non_blank_lines(&contents).collect();
        self.parse_lines(lines).map(Some)
    }

    /// Read the most recent `limit` records, oldest first
    ///
    /// Only the returned lines are parsed. Returns `Ok(None)` when the log
    /// has not been created yet.
    pub async fn tail(&self, limit: usize) -> Result<Option<Vec<Value>>> {
        let Some(contents) = self.read_contents().await? else {
            return Ok(None);
        };

        let lines: Vec<_> = non_blank_lines(&contents).collect();
        let start = lines.len().saturating_sub(limit);
        self.parse_lines(lines[start..].to_vec()).map(Some)
    }

    async fn read_contents(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackingError::io(&self.path, e)),
        }
    }

    fn parse_lines(&self, lines: Vec<(usize, &str)>) -> Result<Vec<Value>> {
        lines
            .into_iter()
            .map(|(line, text)| {
                serde_json::from_str(text).map_err(|source| TrackingError::MalformedLine {
                    path: self.path.clone(),
                    line,
                    source,
                })
            })
            .collect()
    }
}

/// Non-blank lines paired with their 1-based line number
fn non_blank_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_append_creates_directory_and_stamps() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("nested/visitors.jsonl"));

        assert!(log.append(record(json!({"url": "https://oaibot.net/"}))).await);

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.ends_with('\n'));
        let parsed: Value = serde_json::from_str(contents.trim_end()).unwrap();
        assert_eq!(parsed["url"], "https://oaibot.net/");
        assert!(parsed[SERVER_TIMESTAMP_FIELD].is_string());
    }

    #[tokio::test]
    async fn test_append_preserves_non_ascii() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("visitors.jsonl"));

        log.try_append(record(json!({"referrer": "https://例え.jp/città"})))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("例え.jp/città"));
        assert!(!contents.contains("\\u"));
    }

    #[tokio::test]
    async fn test_server_timestamp_overrides_client_value() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("visitors.jsonl"));

        let written = log
            .try_append(record(json!({"server_timestamp": "forged"})))
            .await
            .unwrap();

        assert_ne!(written[SERVER_TIMESTAMP_FIELD], "forged");
    }

    #[tokio::test]
    async fn test_append_failure_returns_false() {
        let dir = tempdir().unwrap();
        // A directory where the log file should be makes open() fail
        let path = dir.path().join("visitors.jsonl");
        std::fs::create_dir(&path).unwrap();

        let log = EventLog::new(&path);
        assert!(!log.append(record(json!({"a": 1}))).await);
    }

    #[tokio::test]
    async fn test_read_missing_log() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("visitors.jsonl"));

        assert!(log.read_all().await.unwrap().is_none());
        assert!(log.tail(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("visitors.jsonl");
        std::fs::write(&path, "{\"n\":1}\n\n   \n{\"n\":2}\n").unwrap();

        let log = EventLog::new(&path);
        let all = log.read_all().await.unwrap().unwrap();
        assert_eq!(all, vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_malformed_line_reports_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("visitors.jsonl");
        std::fs::write(&path, "{\"n\":1}\nnot json\n").unwrap();

        let log = EventLog::new(&path);
        match log.read_all().await.unwrap_err() {
            TrackingError::MalformedLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_tail_ignores_older_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("visitors.jsonl");
        std::fs::write(&path, "garbage\n{\"n\":1}\n{\"n\":2}\n").unwrap();

        let log = EventLog::new(&path);
        let tail = log.tail(2).await.unwrap().unwrap();
        assert_eq!(tail, vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_append_start_event() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("bot_starts.jsonl"));

        let event = StartEvent::builder().user_id(1).language_code("fr").build();
        assert!(log.append_event(&event).await);

        let all = log.read_all().await.unwrap().unwrap();
        assert_eq!(all[0]["country"], "France");
        assert_eq!(all[0]["user_id"], 1);
    }
}
