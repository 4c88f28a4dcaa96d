//! Tracking service configuration

use crate::error::Result;
use onion_utils::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// `0.0.0.0:8080`
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
pub(crate) const DEFAULT_VISITS_LIMIT: usize = 100;

/// Configuration for the tracking service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// Number of records returned by `GET /visits`
    pub visits_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            visits_limit: DEFAULT_VISITS_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Create config from an arbitrary key lookup
    ///
    /// Reads `TRACKING_BIND_ADDR` (default `0.0.0.0:8080`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = match lookup("TRACKING_BIND_ADDR") {
            Some(value) => parse_bind_addr(&value)?,
            None => DEFAULT_BIND_ADDR,
        };
        Ok(Self {
            bind_addr,
            ..Self::default()
        })
    }

    /// Set the bind address
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the number of records returned by `GET /visits`
    pub fn with_visits_limit(mut self, limit: usize) -> Self {
        self.visits_limit = limit;
        self
    }
}

/// Parse a `host:port` bind address
fn parse_bind_addr(value: &str) -> Result<SocketAddr> {
    value.trim().parse().map_err(|e: std::net::AddrParseError| {
        ConfigError::Invalid {
            name: "TRACKING_BIND_ADDR",
            reason: format!("{value:?}: {e}"),
        }
        .into()
    })
}
