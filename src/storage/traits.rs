//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::AggregatedRecord;
use crate::extract::EmailFilterRule;
use crate::state::RunStatus;
use crate::storage::{
    EmailFilterRecord, ProgressSnapshot, ProjectRecord, ProxyRecord, RunRecord, RunSettings,
    ScrapeTarget, ScrapedDataRecord,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the orchestrator,
/// the proxy maintenance entry points and the CLI. Implementations are
/// shared between workers behind a mutex.
pub trait Storage: Send {
    // ===== Projects =====

    /// Creates a project owned by `user_id`
    ///
    /// # Returns
    ///
    /// The ID of the newly created project
    fn create_project(&mut self, user_id: i64, name: &str) -> StorageResult<i64>;

    /// Gets a project by ID
    fn get_project(&self, project_id: i64) -> StorageResult<ProjectRecord>;

    /// Appends homepages to a project, skipping blank lines
    ///
    /// # Returns
    ///
    /// The number of URLs stored
    fn add_project_urls(&mut self, project_id: i64, urls: &[String]) -> StorageResult<usize>;

    /// Counts the homepages of a project
    fn count_project_urls(&self, project_id: i64) -> StorageResult<u64>;

    /// Gets one batch of homepages in insertion order
    ///
    /// # Arguments
    ///
    /// * `project_id` - The project
    /// * `offset` - Number of homepages to skip
    /// * `limit` - Maximum number of homepages to return
    fn get_pending_urls(
        &self,
        project_id: i64,
        offset: u64,
        limit: u64,
    ) -> StorageResult<Vec<ScrapeTarget>>;

    /// Sets the project status; `Completed` also stamps `completed_at`
    fn set_project_status(&mut self, project_id: i64, status: RunStatus) -> StorageResult<()>;

    fn set_total_urls(&mut self, project_id: i64, total: u64) -> StorageResult<()>;

    /// Reads the stored pause flag
    fn is_paused(&self, project_id: i64) -> StorageResult<bool>;

    fn set_paused(&mut self, project_id: i64, paused: bool) -> StorageResult<()>;

    /// Recomputes processed count, email total and percentage from stored
    /// results and writes them to the project row
    fn update_progress(&mut self, project_id: i64) -> StorageResult<ProgressSnapshot>;

    /// Sets the pause flag on every running, unpaused project
    ///
    /// # Returns
    ///
    /// The IDs of the projects that were paused
    fn recover_stuck_projects(&mut self) -> StorageResult<Vec<i64>>;

    // ===== Settings =====

    /// Gets a user's run settings, creating the default row when absent
    fn get_settings(&mut self, user_id: i64) -> StorageResult<RunSettings>;

    /// Inserts or replaces a user's run settings
    fn save_settings(&mut self, user_id: i64, settings: &RunSettings) -> StorageResult<()>;

    // ===== Proxies =====

    fn add_proxy(&mut self, user_id: i64, proxy_url: &str, proxy_type: &str)
        -> StorageResult<i64>;

    fn get_proxy(&self, proxy_id: i64) -> StorageResult<ProxyRecord>;

    /// Gets every proxy of a user, active or not
    fn get_user_proxies(&self, user_id: i64) -> StorageResult<Vec<ProxyRecord>>;

    fn get_active_proxies(&self, user_id: i64) -> StorageResult<Vec<ProxyRecord>>;

    /// Stores the outcome of a maintenance health test
    fn record_proxy_test(
        &mut self,
        proxy_id: i64,
        is_active: bool,
        tested_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    // ===== Email Filters =====

    fn add_email_filter(
        &mut self,
        user_id: i64,
        rule: &EmailFilterRule,
        description: Option<&str>,
    ) -> StorageResult<i64>;

    /// Gets the active filters of a user
    fn get_active_filters(&self, user_id: i64) -> StorageResult<Vec<EmailFilterRule>>;

    fn get_user_filters(&self, user_id: i64) -> StorageResult<Vec<EmailFilterRecord>>;

    /// Inserts the default filters a user does not have yet
    ///
    /// # Returns
    ///
    /// The number of filters inserted (0 when already seeded)
    fn seed_default_email_filters(&mut self, user_id: i64) -> StorageResult<usize>;

    // ===== Scrape Results =====

    /// Normalized homepage URLs that already have a stored result
    fn get_scraped_homepages(&self, project_id: i64) -> StorageResult<HashSet<String>>;

    /// Stores the result for one homepage
    fn insert_scraped_data(
        &mut self,
        project_id: i64,
        record: &AggregatedRecord,
    ) -> StorageResult<i64>;

    fn list_scraped_data(&self, project_id: i64) -> StorageResult<Vec<ScrapedDataRecord>>;

    // ===== Runs =====

    /// Creates a run row in `running` status
    ///
    /// # Arguments
    ///
    /// * `project_id` - The project being run
    /// * `config_hash` - Hash of the configuration file
    fn create_run(&mut self, project_id: i64, config_hash: &str) -> StorageResult<i64>;

    /// Stamps a run with its terminal status and finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    fn get_latest_run(&self, project_id: i64) -> StorageResult<Option<RunRecord>>;
}
