//! Per-country `/start` statistics
//!
//! [`CountryTracker`] owns the stats document on disk. Every update is a
//! read-modify-write of the whole document, done under the tracker's lock so
//! that concurrent callers in the same process never lose an increment.

use crate::error::{Result, TrackingError};
use crate::event::local_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{Instrument, Span, error, info, info_span};

/// The running summary of `/start` commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryStats {
    pub total_starts: u64,
    #[serde(default)]
    pub countries: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl CountryStats {
    /// Count one more start from `country`
    pub fn record(&mut self, country: &str, at: impl Into<String>) {
        self.total_starts += 1;
        *self.countries.entry(country.to_string()).or_insert(0) += 1;
        self.last_updated = Some(at.into());
    }

    /// Whether the total equals the sum of the per-country counts
    pub fn is_consistent(&self) -> bool {
        self.countries.values().sum::<u64>() == self.total_starts
    }

    /// Count for a single country
    pub fn count(&self, country: &str) -> u64 {
        self.countries.get(country).copied().unwrap_or(0)
    }
}

/// Exclusive owner of the stats document
#[derive(Debug)]
pub struct CountryTracker {
    path: PathBuf,
    lock: Mutex<()>,
    span: Span,
}

impl CountryTracker {
    /// Create a tracker backed by `path`; the document is created on the
    /// first recorded start
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let span = info_span!("country_tracker", path = %path.display());
        Self {
            path,
            lock: Mutex::new(()),
            span,
        }
    }

    /// Replace the span the tracker's operations are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Path of the stats document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one start from `country`
    ///
    /// Returns the updated document, or `None` if it could not be read or
    /// written. Failures are logged, never propagated.
    pub async fn record_country(&self, country: &str) -> Option<CountryStats> {
        match self.try_record_country(country).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                self.span
                    .in_scope(|| error!(country, error = %e, "failed to update country stats"));
                None
            }
        }
    }

    /// Record one start from `country`, returning the updated document
    ///
    /// A malformed existing document is left untouched.
    pub async fn try_record_country(&self, country: &str) -> Result<CountryStats> {
        async {
            let _guard = self.lock.lock().await;

            let mut stats = self.load().await?;
            stats.record(country, local_timestamp());
            self.store(&stats).await?;

            info!(country, total_starts = stats.total_starts, "country stats updated");
            Ok(stats)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Current document, or an empty one if none has been written yet
    pub async fn snapshot(&self) -> Result<CountryStats> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn load(&self) -> Result<CountryStats> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CountryStats::default());
            }
            Err(e) => return Err(TrackingError::io(&self.path, e)),
        };

        serde_json::from_str(&contents).map_err(|source| TrackingError::MalformedStats {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a sibling file, then rename over the document
    async fn store(&self, stats: &CountryStats) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TrackingError::io(parent, e))?;
        }

        let mut contents = serde_json::to_string_pretty(stats)?;
        contents.push('\n');

        let tmp = self.tmp_path();
        fs::write(&tmp, contents)
            .await
            .map_err(|e| TrackingError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| TrackingError::io(&self.path, e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
