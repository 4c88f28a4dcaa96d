//! Tracking server lifecycle

use crate::config::ServerConfig;
use crate::error::{Result, TrackerError};
use crate::routes::{AppState, router};
use onion_core::EventLog;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Instrument, Span, info, info_span};

/// Serves the tracking routes over a visitor log
pub struct TrackingServer {
    config: ServerConfig,
    visits: Arc<EventLog>,
    span: Span,
}

impl TrackingServer {
    /// Create a server over `visits`
    pub fn new(config: ServerConfig, visits: Arc<EventLog>) -> Self {
        Self {
            config,
            visits,
            span: info_span!("tracking_server"),
        }
    }

    /// Replace the tracing span requests are served in
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Bind the configured address and serve until `shutdown` completes
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TrackerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener.local_addr().map_err(TrackerError::Serve)?;
        let state = AppState::new(self.visits.clone()).with_visits_limit(self.config.visits_limit);
        let app = router(state);

        let span = self.span.clone();
        async move {
            info!(log_file = %self.visits.path().display(), "tracking server starting");
            info!("POST /track  - receive tracking data");
            info!("GET  /stats  - visitor statistics");
            info!("GET  /visits - recent visits");
            info!("listening on http://{addr}");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(TrackerError::Serve)?;

            info!("tracking server stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
