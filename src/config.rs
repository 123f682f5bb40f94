/// Configuration management for the Lifetracker backend
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Upper bounds keep `chrono::Duration` arithmetic in range
const MAX_SESSION_TTL_DAYS: i64 = 3650;
const MAX_REGISTRATION_GRACE_MINUTES: i64 = 7 * 24 * 60;
const MAX_SWEEP_SECS: u64 = 7 * 24 * 60 * 60;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: Option<EmailConfig>,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Normalized connection string
    pub database_url: String,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a bearer session in days
    pub session_ttl_days: i64,
    /// Require the emailed code before an account becomes usable
    pub email_verification: bool,
    /// How long a pending registration blocks its name/email, and how old an
    /// unverified account must be before the sweeper removes it
    pub registration_grace_minutes: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Background job intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub session_sweep_secs: u64,
    pub registration_sweep_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Coerce legacy connection string schemes to the form sqlx and most drivers expect.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> TrackerResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("LIFETRACKER_HOSTNAME").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("LIFETRACKER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| TrackerError::Validation("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let database_url = normalize_database_url(
            &env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/tracker.db".to_string()),
        );
        let max_connections = env::var("LIFETRACKER_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let session_ttl_days = env::var("LIFETRACKER_SESSION_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| TrackerError::Validation("Invalid session TTL".to_string()))?;
        let registration_grace_minutes = env::var("LIFETRACKER_REGISTRATION_GRACE_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| TrackerError::Validation("Invalid registration grace window".to_string()))?;

        let email = if let Ok(smtp_url) = env::var("LIFETRACKER_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("LIFETRACKER_MAIL_FROM")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        // Verification defaults to on whenever there is a way to deliver the code
        let email_verification = match env::var("EMAIL_VERIFICATION_ENABLED") {
            Ok(v) => parse_flag(&v)
                .ok_or_else(|| TrackerError::Validation("Invalid EMAIL_VERIFICATION_ENABLED".to_string()))?,
            Err(_) => email.is_some(),
        };

        let session_sweep_secs = env::var("LIFETRACKER_SESSION_SWEEP_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);
        let registration_sweep_secs = env::var("LIFETRACKER_REGISTRATION_SWEEP_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "lifetracker=info,tower_http=info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                database_url,
                max_connections,
            },
            authentication: AuthConfig {
                session_ttl_days,
                email_verification,
                registration_grace_minutes,
            },
            email,
            jobs: JobsConfig {
                session_sweep_secs,
                registration_sweep_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> TrackerResult<()> {
        if self.service.hostname.is_empty() {
            return Err(TrackerError::Validation("Hostname cannot be empty".to_string()));
        }

        if !self.storage.database_url.starts_with("sqlite:") {
            return Err(TrackerError::Validation(format!(
                "Unsupported database URL scheme in '{}': only sqlite is compiled in",
                redact_url(&self.storage.database_url)
            )));
        }

        if self.storage.max_connections == 0 {
            return Err(TrackerError::Validation(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.authentication.session_ttl_days) {
            return Err(TrackerError::Validation(format!(
                "Session TTL must be between 1 and {} days",
                MAX_SESSION_TTL_DAYS
            )));
        }

        if !(1..=MAX_REGISTRATION_GRACE_MINUTES).contains(&self.authentication.registration_grace_minutes) {
            return Err(TrackerError::Validation(format!(
                "Registration grace window must be between 1 and {} minutes",
                MAX_REGISTRATION_GRACE_MINUTES
            )));
        }

        if self.authentication.email_verification && self.email.is_none() {
            return Err(TrackerError::Validation(
                "Email verification requires LIFETRACKER_SMTP_URL".to_string(),
            ));
        }

        let sweeps = 1..=MAX_SWEEP_SECS;
        if !sweeps.contains(&self.jobs.session_sweep_secs)
            || !sweeps.contains(&self.jobs.registration_sweep_secs)
        {
            return Err(TrackerError::Validation(format!(
                "Sweep intervals must be between 1 and {} seconds",
                MAX_SWEEP_SECS
            )));
        }

        Ok(())
    }

    /// Configuration for tests: in-memory database, verification off
    pub fn for_tests() -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8000,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                database_url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            authentication: AuthConfig {
                session_ttl_days: 30,
                email_verification: false,
                registration_grace_minutes: 15,
            },
            email: None,
            jobs: JobsConfig {
                session_sweep_secs: 3600,
                registration_sweep_secs: 300,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Strip credentials from a connection string before it reaches a log line
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
