//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::AggregatedRecord;
use crate::extract::{EmailFilterRule, FilterKind, Platform, SocialLinks};
use crate::fetch::FetchMethod;
use crate::state::{progress_percent, RunStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    EmailFilterRecord, ProgressSnapshot, ProjectRecord, ProxyRecord, RunRecord, RunSettings,
    ScrapeTarget, ScrapedDataRecord, DEFAULT_EMAIL_FILTERS,
};
use crate::url::normalize_url;
use crate::ScoutError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn project_from_row(row: &Row) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(3)?).unwrap_or(RunStatus::Pending),
        progress: row.get(4)?,
        total_urls: row.get::<_, i64>(5)?.max(0) as u64,
        processed_urls: row.get::<_, i64>(6)?.max(0) as u64,
        emails_found: row.get::<_, i64>(7)?.max(0) as u64,
        paused: row.get(8)?,
        created_at: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

fn proxy_from_row(row: &Row) -> rusqlite::Result<ProxyRecord> {
    Ok(ProxyRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        proxy_url: row.get(2)?,
        proxy_type: row.get(3)?,
        is_active: row.get(4)?,
        last_tested: row.get(5)?,
    })
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Error),
    })
}

const PROJECT_COLUMNS: &str = "id, name, user_id, status, progress, total_urls, processed_urls,
     emails_found, paused, created_at, completed_at";

const PROXY_COLUMNS: &str = "id, user_id, proxy_url, proxy_type, is_active, last_tested";

impl Storage for SqliteStorage {
    // ===== Projects =====

    fn create_project(&mut self, user_id: i64, name: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO projects (name, user_id, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, user_id, RunStatus::Pending.to_db_string(), now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_project(&self, project_id: i64) -> StorageResult<ProjectRecord> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        self.conn
            .query_row(&sql, params![project_id], project_from_row)
            .optional()?
            .ok_or(StorageError::NotFound {
                what: "Project",
                id: project_id,
            })
    }

    fn add_project_urls(&mut self, project_id: i64, urls: &[String]) -> StorageResult<usize> {
        let added_at = now();
        let tx = self.conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO project_urls (project_id, url, added_at) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
                stmt.execute(params![project_id, url, added_at])?;
                added += 1;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    fn count_project_urls(&self, project_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM project_urls WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_pending_urls(
        &self,
        project_id: i64,
        offset: u64,
        limit: u64,
    ) -> StorageResult<Vec<ScrapeTarget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, url FROM project_urls
             WHERE project_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(params![project_id, to_i64(limit), to_i64(offset)], |row| {
            Ok(ScrapeTarget {
                id: row.get(0)?,
                project_id: row.get(1)?,
                url: row.get(2)?,
            })
        })?;

        let mut targets = Vec::new();
        for row in rows {
            targets.push(row?);
        }
        Ok(targets)
    }

    fn set_project_status(&mut self, project_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = if status == RunStatus::Completed {
            self.conn.execute(
                "UPDATE projects SET status = ?1, progress = 100, completed_at = ?2 WHERE id = ?3",
                params![status.to_db_string(), now(), project_id],
            )?
        } else {
            self.conn.execute(
                "UPDATE projects SET status = ?1 WHERE id = ?2",
                params![status.to_db_string(), project_id],
            )?
        };

        if updated == 0 {
            return Err(StorageError::NotFound {
                what: "Project",
                id: project_id,
            });
        }
        Ok(())
    }

    fn set_total_urls(&mut self, project_id: i64, total: u64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE projects SET total_urls = ?1 WHERE id = ?2",
            params![to_i64(total), project_id],
        )?;
        Ok(())
    }

    fn is_paused(&self, project_id: i64) -> StorageResult<bool> {
        self.conn
            .query_row(
                "SELECT paused FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StorageError::NotFound {
                what: "Project",
                id: project_id,
            })
    }

    fn set_paused(&mut self, project_id: i64, paused: bool) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE projects SET paused = ?1 WHERE id = ?2",
            params![paused, project_id],
        )?;
        Ok(())
    }

    fn update_progress(&mut self, project_id: i64) -> StorageResult<ProgressSnapshot> {
        let (processed, emails): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(unique_emails_found), 0)
             FROM scraped_data WHERE project_id = ?1",
            params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total = self.get_project(project_id)?.total_urls;

        let snapshot = ProgressSnapshot {
            processed: processed as u64,
            emails: emails as u64,
            percent: progress_percent(processed as u64, total),
        };

        self.conn.execute(
            "UPDATE projects SET processed_urls = ?1, emails_found = ?2, progress = ?3 WHERE id = ?4",
            params![processed, emails, snapshot.percent, project_id],
        )?;

        Ok(snapshot)
    }

    fn recover_stuck_projects(&mut self) -> StorageResult<Vec<i64>> {
        let ids = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM projects WHERE status = ?1 AND paused = 0")?;
            let rows = stmt.query_map(params![RunStatus::Running.to_db_string()], |row| row.get(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            ids
        };

        self.conn.execute(
            "UPDATE projects SET paused = 1 WHERE status = ?1 AND paused = 0",
            params![RunStatus::Running.to_db_string()],
        )?;
        Ok(ids)
    }

    // ===== Settings =====

    fn get_settings(&mut self, user_id: i64) -> StorageResult<RunSettings> {
        let existing = self
            .conn
            .query_row(
                "SELECT max_threads, request_timeout, max_retries, use_proxies,
                 max_internal_links, url_exclusion_patterns
                 FROM settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(RunSettings {
                        max_threads: row.get::<_, i64>(0)?.max(1) as usize,
                        request_timeout: row.get::<_, i64>(1)?.max(1) as u64,
                        max_retries: row.get::<_, i64>(2)?.max(1) as u32,
                        use_proxies: row.get(3)?,
                        max_internal_links: row.get::<_, i64>(4)?.max(0) as usize,
                        url_exclusion_patterns: row.get(5)?,
                    })
                },
            )
            .optional()?;

        match existing {
            Some(settings) => Ok(settings),
            None => {
                let settings = RunSettings::default();
                self.save_settings(user_id, &settings)?;
                tracing::info!("Created default settings for user {}", user_id);
                Ok(settings)
            }
        }
    }

    fn save_settings(&mut self, user_id: i64, settings: &RunSettings) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO settings (user_id, max_threads, request_timeout, max_retries,
                                   use_proxies, max_internal_links, url_exclusion_patterns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                max_threads = excluded.max_threads,
                request_timeout = excluded.request_timeout,
                max_retries = excluded.max_retries,
                use_proxies = excluded.use_proxies,
                max_internal_links = excluded.max_internal_links,
                url_exclusion_patterns = excluded.url_exclusion_patterns",
            params![
                user_id,
                settings.max_threads as i64,
                to_i64(settings.request_timeout),
                settings.max_retries,
                settings.use_proxies,
                settings.max_internal_links as i64,
                settings.url_exclusion_patterns,
            ],
        )?;
        Ok(())
    }

    // ===== Proxies =====

    fn add_proxy(
        &mut self,
        user_id: i64,
        proxy_url: &str,
        proxy_type: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO proxies (user_id, proxy_url, proxy_type, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, proxy_url, proxy_type, now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_proxy(&self, proxy_id: i64) -> StorageResult<ProxyRecord> {
        let sql = format!("SELECT {} FROM proxies WHERE id = ?1", PROXY_COLUMNS);
        self.conn
            .query_row(&sql, params![proxy_id], proxy_from_row)
            .optional()?
            .ok_or(StorageError::NotFound {
                what: "Proxy",
                id: proxy_id,
            })
    }

    fn get_user_proxies(&self, user_id: i64) -> StorageResult<Vec<ProxyRecord>> {
        let sql = format!(
            "SELECT {} FROM proxies WHERE user_id = ?1 ORDER BY id",
            PROXY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], proxy_from_row)?;

        let mut proxies = Vec::new();
        for row in rows {
            proxies.push(row?);
        }
        Ok(proxies)
    }

    fn get_active_proxies(&self, user_id: i64) -> StorageResult<Vec<ProxyRecord>> {
        Ok(self
            .get_user_proxies(user_id)?
            .into_iter()
            .filter(|p| p.is_active)
            .collect())
    }

    fn record_proxy_test(
        &mut self,
        proxy_id: i64,
        is_active: bool,
        tested_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE proxies SET is_active = ?1, last_tested = ?2 WHERE id = ?3",
            params![is_active, tested_at.to_rfc3339(), proxy_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                what: "Proxy",
                id: proxy_id,
            });
        }
        Ok(())
    }

    // ===== Email Filters =====

    fn add_email_filter(
        &mut self,
        user_id: i64,
        rule: &EmailFilterRule,
        description: Option<&str>,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO email_filters (user_id, pattern, filter_type, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                rule.pattern,
                rule.kind.to_db_string(),
                description,
                now()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_active_filters(&self, user_id: i64) -> StorageResult<Vec<EmailFilterRule>> {
        Ok(self
            .get_user_filters(user_id)?
            .into_iter()
            .filter(|f| f.is_active)
            .map(|f| f.rule)
            .collect())
    }

    fn get_user_filters(&self, user_id: i64) -> StorageResult<Vec<EmailFilterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, pattern, filter_type, description, is_active
             FROM email_filters WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let kind: String = row.get(3)?;
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                kind,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;

        let mut filters = Vec::new();
        for row in rows {
            let (id, user_id, pattern, kind, description, is_active) = row?;
            let Some(kind) = FilterKind::from_db_string(&kind) else {
                tracing::warn!("Ignoring email filter {} with unknown type '{}'", id, kind);
                continue;
            };
            filters.push(EmailFilterRecord {
                id,
                user_id,
                rule: EmailFilterRule::new(pattern, kind),
                description,
                is_active,
            });
        }
        Ok(filters)
    }

    fn seed_default_email_filters(&mut self, user_id: i64) -> StorageResult<usize> {
        let mut inserted = 0;
        for (pattern, kind, description) in DEFAULT_EMAIL_FILTERS {
            let exists: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM email_filters
                     WHERE user_id = ?1 AND pattern = ?2 AND filter_type = ?3",
                    params![user_id, pattern, kind.to_db_string()],
                    |row| row.get(0),
                )
                .optional()?;

            if exists.is_none() {
                self.add_email_filter(
                    user_id,
                    &EmailFilterRule::new(*pattern, *kind),
                    Some(*description),
                )?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    // ===== Scrape Results =====

    fn get_scraped_homepages(&self, project_id: i64) -> StorageResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT homepage_url FROM scraped_data WHERE project_id = ?1")?;
        let rows = stmt.query_map(params![project_id], |row| row.get::<_, String>(0))?;

        let mut homepages = HashSet::new();
        for row in rows {
            homepages.insert(normalize_url(&row?));
        }
        Ok(homepages)
    }

    fn insert_scraped_data(
        &mut self,
        project_id: i64,
        record: &AggregatedRecord,
    ) -> StorageResult<i64> {
        let internal_links = serde_json::to_string(&record.checked_urls)?;
        let emails: Vec<&String> = record.emails.iter().collect();
        let emails = serde_json::to_string(&emails)?;
        let social = |platform: Platform| record.social.get(platform).map(str::to_string);

        self.conn.execute(
            "INSERT INTO scraped_data (
                project_id, homepage_url, internal_links_checked, internal_links_list,
                unique_emails_found, emails_list, is_contact_page, contact_page_url,
                facebook_link, twitter_link, linkedin_link, instagram_link,
                youtube_link, pinterest_link, tiktok_link,
                http_status, scrape_method, scraped_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                project_id,
                record.homepage_url,
                record.checked_urls.len() as i64,
                internal_links,
                record.email_count() as i64,
                emails,
                record.is_contact_page(),
                record.contact_page_url,
                social(Platform::Facebook),
                social(Platform::Twitter),
                social(Platform::LinkedIn),
                social(Platform::Instagram),
                social(Platform::YouTube),
                social(Platform::Pinterest),
                social(Platform::TikTok),
                record.http_status,
                record.method.to_db_string(),
                now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_scraped_data(&self, project_id: i64) -> StorageResult<Vec<ScrapedDataRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, homepage_url, internal_links_list, emails_list,
                    contact_page_url,
                    facebook_link, twitter_link, linkedin_link, instagram_link,
                    youtube_link, pinterest_link, tiktok_link,
                    http_status, scrape_method, scraped_at
             FROM scraped_data WHERE project_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            let mut social = SocialLinks::default();
            for (offset, platform) in Platform::ALL.iter().enumerate() {
                if let Some(url) = row.get::<_, Option<String>>(6 + offset)? {
                    social.set_if_absent(*platform, url);
                }
            }

            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                social,
                row.get::<_, Option<u16>>(13)?,
                row.get::<_, String>(14)?,
                row.get::<_, String>(15)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, project_id, homepage_url, links, emails, contact, social, status, method, at) =
                row?;
            records.push(ScrapedDataRecord {
                id,
                project_id,
                homepage_url,
                internal_links: serde_json::from_str(&links)?,
                emails: serde_json::from_str(&emails)?,
                contact_page_url: contact,
                social,
                http_status: status,
                scrape_method: FetchMethod::from_db_string(&method),
                scraped_at: at,
            });
        }
        Ok(records)
    }

    // ===== Runs =====

    fn create_run(&mut self, project_id: i64, config_hash: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (project_id, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                project_id,
                now(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                what: "Run",
                id: run_id,
            });
        }
        Ok(())
    }

    fn get_latest_run(&self, project_id: i64) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, project_id, started_at, finished_at, config_hash, status
                 FROM runs WHERE project_id = ?1 ORDER BY id DESC LIMIT 1",
                params![project_id],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }
}
