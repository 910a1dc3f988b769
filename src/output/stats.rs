//! Statistics generation from the results database
//!
//! This module provides functionality for summarizing a project's stored
//! results and displaying them for the `--stats` mode.

use crate::extract::Platform;
use crate::fetch::FetchMethod;
use crate::state::RunStatus;
use crate::storage::{RunRecord, Storage};
use crate::Result;
use std::collections::{BTreeMap, HashMap};

/// Project statistics summary
#[derive(Debug, Clone)]
pub struct ProjectStatistics {
    pub project_id: i64,
    pub name: String,
    pub status: RunStatus,
    pub paused: bool,
    pub progress: u32,

    /// Homepages submitted to the project
    pub total_urls: u64,

    /// Homepages with a stored result
    pub processed_urls: u64,

    /// Sum of unique emails over every stored result
    pub emails_found: u64,

    /// Results with at least one email
    pub records_with_emails: u64,

    /// Results where a contact page was identified
    pub contact_pages_found: u64,

    /// Pages fetched in total, homepages included
    pub pages_checked: u64,

    /// Results holding a link for each platform
    pub social_by_platform: BTreeMap<&'static str, u64>,

    /// Results per homepage fetch strategy
    pub method_breakdown: HashMap<FetchMethod, u64>,

    /// Most recent run of the project
    pub latest_run: Option<RunRecord>,
}

impl ProjectStatistics {
    /// Share of processed homepages that yielded an email, in percent
    pub fn email_hit_rate(&self) -> f64 {
        if self.processed_urls == 0 {
            return 0.0;
        }
        self.records_with_emails as f64 / self.processed_urls as f64 * 100.0
    }
}

/// Loads statistics for one project
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `project_id` - The project to summarize
///
/// # Returns
///
/// * `Ok(ProjectStatistics)` - Successfully loaded statistics
/// * `Err(ScoutError)` - The project does not exist or a query failed
pub fn load_statistics(storage: &dyn Storage, project_id: i64) -> Result<ProjectStatistics> {
    let project = storage.get_project(project_id)?;
    let records = storage.list_scraped_data(project_id)?;
    let latest_run = storage.get_latest_run(project_id)?;

    let mut social_by_platform: BTreeMap<&'static str, u64> =
        Platform::ALL.iter().map(|p| (p.name(), 0)).collect();
    let mut method_breakdown = HashMap::new();
    let mut records_with_emails = 0;
    let mut contact_pages_found = 0;
    let mut pages_checked = 0;

    for record in &records {
        if !record.emails.is_empty() {
            records_with_emails += 1;
        }
        if record.contact_page_url.is_some() {
            contact_pages_found += 1;
        }
        pages_checked += record.internal_links.len() as u64;

        for (platform, _) in record.social.iter() {
            *social_by_platform.entry(platform.name()).or_insert(0) += 1;
        }
        if let Some(method) = record.scrape_method {
            *method_breakdown.entry(method).or_insert(0) += 1;
        }
    }

    Ok(ProjectStatistics {
        project_id,
        name: project.name,
        status: project.status,
        paused: project.paused,
        progress: project.progress,
        total_urls: project.total_urls,
        processed_urls: records.len() as u64,
        emails_found: records.iter().map(|r| r.emails.len() as u64).sum(),
        records_with_emails,
        contact_pages_found,
        pages_checked,
        social_by_platform,
        method_breakdown,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ProjectStatistics) {
    println!("=== Project {} ({}) ===\n", stats.project_id, stats.name);

    println!("Overview:");
    println!(
        "  Status: {}{}",
        stats.status,
        if stats.paused { " (pause requested)" } else { "" }
    );
    println!(
        "  Progress: {}% ({}/{} homepages)",
        stats.progress, stats.processed_urls, stats.total_urls
    );
    println!("  Pages checked: {}", stats.pages_checked);
    println!();

    println!("Findings:");
    println!("  Emails found: {}", stats.emails_found);
    println!(
        "  Homepages with emails: {} ({:.1}%)",
        stats.records_with_emails,
        stats.email_hit_rate()
    );
    println!("  Contact pages found: {}", stats.contact_pages_found);
    println!();

    println!("Social Profiles:");
    for (platform, count) in &stats.social_by_platform {
        println!("  {}: {}", platform, count);
    }
    println!();

    if !stats.method_breakdown.is_empty() {
        println!("Fetch Methods:");
        let mut methods: Vec<_> = stats.method_breakdown.iter().collect();
        methods.sort_by(|a, b| b.1.cmp(a.1));
        for (method, count) in methods {
            println!("  {}: {}", method, count);
        }
        println!();
    }

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Status: {}", run.status);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Config hash: {}", run.config_hash);
    }
}
