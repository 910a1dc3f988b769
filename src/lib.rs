//! Contact-Scout: a contact harvesting engine
//!
//! This crate visits project homepages and a bounded set of their internal
//! pages to collect contact emails and business social-media profiles. It
//! coordinates a direct HTTP strategy with a headless-browser fallback while
//! sharing a proxy pool and a per-domain rate limiter across workers.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod proxy;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Contact-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("No internet connectivity after waiting {waited_secs}s")]
    NoConnectivity { waited_secs: u64 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Contact-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{AggregatedRecord, Orchestrator, RunOutcome};
pub use fetch::{FetchMethod, FetchResult, FetchStrategy};
pub use state::RunStatus;
pub use url::{host_of, is_same_domain, normalize_url};
