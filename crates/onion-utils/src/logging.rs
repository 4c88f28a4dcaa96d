//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse from `ONION_LOG_FORMAT` style values; anything but `json` is pretty
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    /// Read `ONION_LOG_FORMAT` from the environment
    pub fn from_env() -> Self {
        std::env::var("ONION_LOG_FORMAT")
            .map(|v| Self::from_name(&v))
            .unwrap_or_default()
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence; `default_directive` (e.g.
/// `"warn,onion_core=info"`) applies when it is unset or invalid.
pub fn init_tracing(default_directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
