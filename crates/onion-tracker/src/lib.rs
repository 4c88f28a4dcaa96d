//! HTTP visitor tracking service
//!
//! Web pages post a beacon to `POST /track` on load and unload; each body is
//! appended to the visitor log. Two read endpoints summarise the log:
//!
//! | route | response |
//! |---|---|
//! | `POST /track` | `{"status": "success"}` or `{"status": "error", "message": ...}` |
//! | `OPTIONS /track` | empty 200 (CORS preflight) |
//! | `GET /stats` | `{"total_visits", "referrers", "last_visit"}` |
//! | `GET /visits` | `{"visits": [...]}`, most recent 100 |
//! | `GET /health` | `ok` |

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, TrackerError};
pub use routes::{AppState, router};
pub use server::TrackingServer;
