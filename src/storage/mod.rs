//! Storage module for persisting projects and scrape results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Project lifecycle (status, pause flag, progress counters)
//! - Run inputs: homepages, per-user settings, proxies, email filters
//! - Scrape results, one row per processed homepage
//! - Run tracking with the configuration hash

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::{EmailFilterRule, FilterKind, SocialLinks};
use crate::fetch::FetchMethod;
use crate::state::RunStatus;
use crate::ScoutError;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared by the orchestrator's workers
pub type SharedStorage = Arc<Mutex<dyn Storage>>;

/// Exclusion list given to users without custom settings
pub const DEFAULT_EXCLUSION_PATTERNS: &str = "*/blog/*\n*/news/*\n*/category/*\n*/tag/*\n*/cart/*\n*/checkout/*\n*/login/*\n*/register/*\n*/search/*\n*/cdn-cgi/*\n*/wp-admin/*\n*/wp-includes/*\n*.pdf\n*.zip\n*.xml\n*.json";

/// Filters seeded for new users: (pattern, kind, description)
pub const DEFAULT_EMAIL_FILTERS: &[(&str, FilterKind, &str)] = &[
    (".png", FilterKind::Suffix, "PNG image files"),
    (".jpg", FilterKind::Suffix, "JPG image files"),
    (".jpeg", FilterKind::Suffix, "JPEG image files"),
    (".gif", FilterKind::Suffix, "GIF image files"),
    (".svg", FilterKind::Suffix, "SVG image files"),
    (".webp", FilterKind::Suffix, "WebP image files"),
    (".ico", FilterKind::Suffix, "Icon files"),
    (".css", FilterKind::Suffix, "CSS style files"),
    (".js", FilterKind::Suffix, "JavaScript files"),
    (".woff", FilterKind::Suffix, "Font files"),
    (".woff2", FilterKind::Suffix, "Font files"),
    (
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        FilterKind::Regex,
        "UUID patterns (tracking)",
    ),
    ("_[0-9]+x@", FilterKind::Regex, "Image dimension patterns"),
    ("[0-9]{10,}@", FilterKind::Regex, "Long numeric IDs (tracking)"),
    ("noreply", FilterKind::Contains, "No-reply addresses"),
    ("no-reply", FilterKind::Contains, "No-reply addresses"),
    ("donotreply", FilterKind::Contains, "Do not reply addresses"),
    ("@example.com", FilterKind::Suffix, "Example domain"),
    ("@test.com", FilterKind::Suffix, "Test domain"),
    ("@localhost", FilterKind::Suffix, "Localhost emails"),
    ("@sentry.io", FilterKind::Suffix, "Sentry tracking"),
    ("@wixpress.com", FilterKind::Suffix, "Wix platform emails"),
];

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ScoutError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScoutError> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing between workers
pub fn share(storage: impl Storage + 'static) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage, recovering the guard if a worker panicked
///
/// Every write is a single statement or transaction, so the data behind a
/// poisoned lock is still consistent.
pub fn lock_storage(storage: &SharedStorage) -> MutexGuard<'_, dyn Storage + 'static> {
    storage
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Represents a scraping project
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub status: RunStatus,
    pub progress: u32,
    pub total_urls: u64,
    pub processed_urls: u64,
    pub emails_found: u64,
    pub paused: bool,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// A homepage queued for scraping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub id: i64,
    pub project_id: i64,
    pub url: String,
}

/// Per-user knobs read at run start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub max_threads: usize,
    /// Seconds per request
    pub request_timeout: u64,
    /// Direct attempts per homepage
    pub max_retries: u32,
    pub use_proxies: bool,
    pub max_internal_links: usize,
    pub url_exclusion_patterns: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_threads: 10,
            request_timeout: 20,
            max_retries: 3,
            use_proxies: false,
            max_internal_links: 25,
            url_exclusion_patterns: DEFAULT_EXCLUSION_PATTERNS.to_string(),
        }
    }
}

/// Represents a stored proxy
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub id: i64,
    pub user_id: i64,
    pub proxy_url: String,
    pub proxy_type: String,
    pub is_active: bool,
    pub last_tested: Option<String>,
}

/// Represents a stored email filter
#[derive(Debug, Clone)]
pub struct EmailFilterRecord {
    pub id: i64,
    pub user_id: i64,
    pub rule: EmailFilterRule,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A stored homepage result, as read back for statistics
#[derive(Debug, Clone)]
pub struct ScrapedDataRecord {
    pub id: i64,
    pub project_id: i64,
    pub homepage_url: String,
    pub internal_links: Vec<String>,
    pub emails: Vec<String>,
    pub contact_page_url: Option<String>,
    pub social: SocialLinks,
    pub http_status: Option<u16>,
    pub scrape_method: Option<FetchMethod>,
    pub scraped_at: String,
}

/// Progress recomputed from stored results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: u64,
    pub emails: u64,
    pub percent: u32,
}

/// Represents one run attempt of a project
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub project_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}
