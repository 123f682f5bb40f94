//! Lifetracker - personal data-tracking backend
//!
//! Users define their own tracking categories (a name plus typed fields) and
//! record timestamped entries against them over a bearer-token HTTP API.
pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod entries;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod mailer;
pub mod schema;
pub mod server;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{TrackerError, TrackerResult};
