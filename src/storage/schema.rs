//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Contact-Scout database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Scraping projects: one list of homepages owned by a user
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    progress INTEGER NOT NULL DEFAULT 0,
    total_urls INTEGER NOT NULL DEFAULT 0,
    processed_urls INTEGER NOT NULL DEFAULT 0,
    emails_found INTEGER NOT NULL DEFAULT 0,
    paused INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    completed_at TEXT,
    UNIQUE(user_id, name)
);

-- Homepages to scrape, in insertion order
CREATE TABLE IF NOT EXISTS project_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    http_status INTEGER,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_project_urls_project ON project_urls(project_id);

-- One row per processed homepage
CREATE TABLE IF NOT EXISTS scraped_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    homepage_url TEXT NOT NULL,
    internal_links_checked INTEGER NOT NULL DEFAULT 0,
    internal_links_list TEXT NOT NULL DEFAULT '[]',
    unique_emails_found INTEGER NOT NULL DEFAULT 0,
    emails_list TEXT NOT NULL DEFAULT '[]',
    is_contact_page INTEGER NOT NULL DEFAULT 0,
    contact_page_url TEXT,
    facebook_link TEXT,
    twitter_link TEXT,
    linkedin_link TEXT,
    instagram_link TEXT,
    youtube_link TEXT,
    pinterest_link TEXT,
    tiktok_link TEXT,
    http_status INTEGER,
    scrape_method TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scraped_data_project ON scraped_data(project_id);

-- Per-user run settings
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    max_threads INTEGER NOT NULL,
    request_timeout INTEGER NOT NULL,
    max_retries INTEGER NOT NULL,
    use_proxies INTEGER NOT NULL,
    max_internal_links INTEGER NOT NULL,
    url_exclusion_patterns TEXT NOT NULL DEFAULT ''
);

-- Per-user proxy list
CREATE TABLE IF NOT EXISTS proxies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    proxy_url TEXT NOT NULL,
    proxy_type TEXT NOT NULL DEFAULT 'residential',
    is_active INTEGER NOT NULL DEFAULT 1,
    last_tested TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_proxies_user ON proxies(user_id);

-- Per-user email rejection rules
CREATE TABLE IF NOT EXISTS email_filters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    pattern TEXT NOT NULL,
    filter_type TEXT NOT NULL DEFAULT 'suffix',
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_email_filters_user ON email_filters(user_id);

-- One row per run attempt of a project
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_project ON runs(project_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
