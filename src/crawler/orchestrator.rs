//! Scrape orchestrator - run-level coordination
//!
//! A run walks a project's homepages in fixed-size batches. Each batch is
//! drained by a bounded set of workers; every worker:
//! - Checks the cooperative pause flag before taking a homepage
//! - Fetches the homepage through the fallback policy
//! - Extracts emails, social profiles and categorized links
//! - Visits the prioritized internal pages and folds in their findings
//! - Persists one aggregated record and refreshes the progress counters
//!
//! Setup failures (connectivity, settings, storage) end the run in `error`.
//! Page failures only drop that page's contribution.

use crate::config::Config;
use crate::crawler::connectivity::{wait_for_connectivity, PROBE_INTERVAL};
use crate::crawler::{build_crawl_list, AggregatedRecord, DomainRateLimiter, FetchPolicy};
use crate::extract::{extract_page, EmailFilters};
use crate::fetch::{FetchMethod, FetchResult, FetchStrategy};
use crate::proxy::{test_all, ProxyPool};
use crate::state::{RunHandle, RunState, RunStatus};
use crate::storage::{lock_storage, RunSettings, ScrapeTarget, SharedStorage, Storage};
use crate::url::{normalize_url, ExclusionPatterns};
use crate::Result;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinSet;

/// Hash recorded for runs started without a configuration file
const UNHASHED: &str = "unhashed";

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub project_id: i64,
    pub run_id: i64,
    pub status: RunStatus,
    pub total: u64,
    pub processed: u64,
    pub emails: u64,
}

/// Drives scrape runs over stored projects
pub struct Orchestrator {
    config: Config,
    storage: SharedStorage,
    direct: Arc<dyn FetchStrategy>,
    browser: Option<Arc<dyn FetchStrategy>>,
    state: Arc<RunState>,
    config_hash: String,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration
    /// * `storage` - Shared storage collaborator
    /// * `direct` - The direct HTTP strategy
    /// * `browser` - The browser strategy, `None` to run without escalation
    pub fn new(
        config: Config,
        storage: SharedStorage,
        direct: Arc<dyn FetchStrategy>,
        browser: Option<Arc<dyn FetchStrategy>>,
    ) -> Self {
        Self {
            config,
            storage,
            direct,
            browser,
            state: Arc::new(RunState::default()),
            config_hash: UNHASHED.to_string(),
        }
    }

    /// Sets the configuration hash recorded with each run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Handle for pausing the run from another task
    pub fn handle(&self) -> RunHandle {
        RunHandle::new(Arc::clone(&self.state))
    }

    /// Runs a project to a terminal state
    ///
    /// Browser and HTTP resources are released on every exit path. A pause
    /// requested through `handle()` applies to the next run only; the flag
    /// and counters are cleared once the run ends.
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - The run reached `completed`, `paused` or `incomplete`
    /// * `Err(ScoutError)` - Setup failed; the project and run are marked `error`
    pub async fn start_run(&self, project_id: i64) -> Result<RunOutcome> {
        let result = self.run_project(project_id).await;
        self.state.reset();

        if let Some(browser) = &self.browser {
            browser.shutdown().await;
        }
        self.direct.shutdown().await;

        result
    }

    async fn run_project(&self, project_id: i64) -> Result<RunOutcome> {
        let project = self.storage().get_project(project_id)?;
        let run_id = {
            let mut storage = self.storage();
            storage.set_project_status(project_id, RunStatus::Running)?;
            storage.create_run(project_id, &self.config_hash)?
        };

        tracing::info!(
            "Starting run {} for project {} ({})",
            run_id,
            project_id,
            project.name
        );

        match self.execute(project_id, project.user_id).await {
            Ok(status) => {
                {
                    let mut storage = self.storage();
                    if status == RunStatus::Paused {
                        storage.set_paused(project_id, true)?;
                    }
                    storage.set_project_status(project_id, status)?;
                    storage.finish_run(run_id, status)?;
                }

                let outcome = RunOutcome {
                    project_id,
                    run_id,
                    status,
                    total: self.state.total(),
                    processed: self.state.processed(),
                    emails: self.state.emails(),
                };
                tracing::info!(
                    "Project {} finished as {}: {}/{} homepages, {} emails",
                    project_id,
                    status,
                    outcome.processed,
                    outcome.total,
                    outcome.emails
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Critical error in project {}: {}", project_id, e);
                let mut storage = self.storage();
                if let Err(se) = storage.set_project_status(project_id, RunStatus::Error) {
                    tracing::error!("Failed to mark project {} as error: {}", project_id, se);
                }
                if let Err(se) = storage.finish_run(run_id, RunStatus::Error) {
                    tracing::error!("Failed to close run {}: {}", run_id, se);
                }
                Err(e)
            }
        }
    }

    /// Sets up the run and drains every batch
    ///
    /// # Returns
    ///
    /// The terminal status to record
    async fn execute(&self, project_id: i64, user_id: i64) -> Result<RunStatus> {
        let engine = &self.config.engine;

        if engine.connectivity_check {
            wait_for_connectivity(
                &engine.connectivity_urls,
                Duration::from_secs(engine.connectivity_wait_secs),
                PROBE_INTERVAL,
            )
            .await?;
        }

        let settings = self.storage().get_settings(user_id)?;
        let total = {
            let mut storage = self.storage();
            let total = storage.count_project_urls(project_id)?;
            storage.set_total_urls(project_id, total)?;
            total
        };
        self.state.set_total(total);

        let rules = self.storage().get_active_filters(user_id)?;
        let filters = EmailFilters::new(&rules);
        let exclusions = ExclusionPatterns::parse(&settings.url_exclusion_patterns);

        tracing::info!(
            "Project {}: {} homepages, {} workers, {} retries, {} internal links, {} email filters, {} exclusion patterns",
            project_id,
            total,
            settings.max_threads,
            settings.max_retries,
            settings.max_internal_links,
            filters.len(),
            exclusions.len()
        );

        let proxies = self.prepare_proxies(user_id, settings.use_proxies).await?;
        let already_scraped = self.storage().get_scraped_homepages(project_id)?;
        if !already_scraped.is_empty() {
            tracing::info!(
                "Resuming: {} homepages already scraped",
                already_scraped.len()
            );
        }

        let policy = FetchPolicy::new(
            Arc::clone(&self.direct),
            self.browser.clone(),
            Arc::new(DomainRateLimiter::new(Duration::from_millis(
                engine.domain_delay_ms,
            ))),
            Arc::new(proxies),
            Duration::from_secs(settings.request_timeout),
            Duration::from_millis(engine.retry_backoff_ms),
        );

        let ctx = Arc::new(RunContext {
            project_id,
            storage: Arc::clone(&self.storage),
            state: Arc::clone(&self.state),
            policy,
            filters,
            exclusions,
            settings,
        });

        let batch_size = engine.batch_size.max(1) as u64;
        let mut offset = 0;
        let mut batch_number = 0;

        loop {
            if ctx.pause_requested() {
                tracing::info!("Project {} paused", project_id);
                break;
            }

            let batch = self
                .storage()
                .get_pending_urls(project_id, offset, batch_size)?;
            if batch.is_empty() {
                break;
            }
            offset += batch.len() as u64;
            batch_number += 1;

            let fetched = batch.len();
            let pending: VecDeque<ScrapeTarget> = batch
                .into_iter()
                .filter(|target| !already_scraped.contains(&normalize_url(&target.url)))
                .collect();

            tracing::info!(
                "Processing batch {} ({} URLs, {} to scrape)",
                batch_number,
                fetched,
                pending.len()
            );

            run_batch(&ctx, pending).await;
        }

        if ctx.pause_requested() {
            return Ok(RunStatus::Paused);
        }

        let snapshot = self.storage().update_progress(project_id)?;
        self.state.set_progress(snapshot.processed, snapshot.emails);

        if snapshot.processed >= total {
            Ok(RunStatus::Completed)
        } else {
            tracing::warn!(
                "Project {} incomplete: {}/{} URLs processed",
                project_id,
                snapshot.processed,
                total
            );
            Ok(RunStatus::Incomplete)
        }
    }

    /// Health-tests the user's proxies and builds the run's pool
    ///
    /// Proxying is disabled for the run when the toggle is off, the user has
    /// no active proxies, or none of them pass the test.
    async fn prepare_proxies(&self, user_id: i64, use_proxies: bool) -> Result<ProxyPool> {
        if !use_proxies {
            return Ok(ProxyPool::disabled());
        }

        let candidates: Vec<String> = self
            .storage()
            .get_active_proxies(user_id)?
            .into_iter()
            .map(|proxy| proxy.proxy_url)
            .collect();

        if candidates.is_empty() {
            tracing::warn!("Proxies enabled but user {} has none active", user_id);
            return Ok(ProxyPool::disabled());
        }

        let proxy_config = &self.config.proxy;
        tracing::info!("Testing {} proxies", candidates.len());
        let tested = candidates.len();
        let working = test_all(
            candidates,
            proxy_config.test_concurrency,
            Duration::from_secs(proxy_config.test_timeout_secs),
            &proxy_config.test_url,
            &self.config.http,
        )
        .await;

        if working.is_empty() {
            tracing::warn!("No working proxies out of {}, continuing without proxies", tested);
            return Ok(ProxyPool::disabled());
        }

        tracing::info!("{}/{} proxies working", working.len(), tested);
        Ok(ProxyPool::new(working, proxy_config.failure_threshold))
    }

    fn storage(&self) -> MutexGuard<'_, dyn Storage + 'static> {
        lock_storage(&self.storage)
    }
}

/// Everything a worker needs for one run
struct RunContext {
    project_id: i64,
    storage: SharedStorage,
    state: Arc<RunState>,
    policy: FetchPolicy,
    filters: EmailFilters,
    exclusions: ExclusionPatterns,
    settings: RunSettings,
}

impl RunContext {
    /// True when the in-process flag or the stored flag asks for a pause
    fn pause_requested(&self) -> bool {
        if self.state.is_paused() {
            return true;
        }

        let stored = lock_storage(&self.storage).is_paused(self.project_id);
        match stored {
            Ok(true) => {
                self.state.pause();
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("Failed to read pause flag: {}", e);
                false
            }
        }
    }

    /// Pulls homepages off the shared queue until it is empty or paused
    async fn work(&self, worker: usize, queue: Arc<Mutex<VecDeque<ScrapeTarget>>>) {
        loop {
            if self.pause_requested() {
                break;
            }

            let next = queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front();
            let Some(target) = next else {
                break;
            };

            self.process_homepage(worker, &target).await;
        }
    }

    /// Runs the whole per-homepage pipeline
    async fn process_homepage(&self, worker: usize, target: &ScrapeTarget) {
        let homepage_url = normalize_url(&target.url);

        let result = self
            .policy
            .fetch(&homepage_url, self.settings.max_retries, worker)
            .await;
        let (mut final_url, mut status_code, body, mut method) = match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
                method,
            } => (final_url, status_code, body, method),
            failed => {
                tracing::warn!("Failed to scrape {}: {}", homepage_url, failed.describe());
                return;
            }
        };

        let mut page = extract_page(&final_url, &body, &self.filters);

        // Script-rendered sites often hide contact details from plain HTTP
        if method == FetchMethod::Direct && page.emails.is_empty() && self.policy.has_browser() {
            tracing::info!(
                "No emails found directly on {}, trying the browser",
                homepage_url
            );
            match self.policy.fetch_with_browser(&homepage_url, worker).await {
                Some(FetchResult::Success {
                    final_url: rendered_url,
                    status_code: rendered_status,
                    body: rendered,
                    method: rendered_method,
                }) => {
                    page = extract_page(&rendered_url, &rendered, &self.filters);
                    final_url = rendered_url;
                    status_code = rendered_status;
                    method = rendered_method;
                }
                Some(failed) => {
                    tracing::debug!(
                        "Browser re-fetch of {} failed, keeping direct result: {}",
                        homepage_url,
                        failed.describe()
                    );
                }
                None => {}
            }
        }

        let crawl_list = build_crawl_list(
            &page.links,
            &self.exclusions,
            self.settings.max_internal_links,
        );
        tracing::debug!(
            "Will scrape {} internal pages for {} (limit: {})",
            crawl_list.len(),
            homepage_url,
            self.settings.max_internal_links
        );

        let mut record =
            AggregatedRecord::from_homepage(homepage_url.clone(), page, Some(status_code), method);
        let mut checked: HashSet<String> =
            [normalize_url(&homepage_url), normalize_url(&final_url)]
                .into_iter()
                .collect();

        for link in crawl_list {
            if !checked.insert(normalize_url(&link)) {
                continue;
            }
            record.mark_checked(link.clone());

            match self.policy.fetch(&link, 1, worker).await {
                FetchResult::Success {
                    final_url, body, ..
                } => {
                    let internal = extract_page(&final_url, &body, &self.filters);
                    record.absorb(&link, internal);
                }
                failed => {
                    tracing::debug!("Skipping {}: {}", link, failed.describe());
                }
            }
        }

        self.persist(&record);
    }

    /// Stores a record and refreshes the progress counters
    fn persist(&self, record: &AggregatedRecord) {
        let mut storage = lock_storage(&self.storage);

        if let Err(e) = storage.insert_scraped_data(self.project_id, record) {
            tracing::error!("Failed to save results for {}: {}", record.homepage_url, e);
            return;
        }

        match storage.update_progress(self.project_id) {
            Ok(snapshot) => {
                self.state.set_progress(snapshot.processed, snapshot.emails);
                if snapshot.processed % 10 == 0 {
                    tracing::info!(
                        "Project {}: {}/{} ({}%), {} emails",
                        self.project_id,
                        snapshot.processed,
                        self.state.total(),
                        snapshot.percent,
                        snapshot.emails
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    "Failed to update progress for project {}: {}",
                    self.project_id,
                    e
                );
            }
        }
    }
}

/// Drains one batch with up to `max_threads` workers
async fn run_batch(ctx: &Arc<RunContext>, targets: VecDeque<ScrapeTarget>) {
    if targets.is_empty() {
        return;
    }

    let workers = ctx.settings.max_threads.max(1).min(targets.len());
    let queue = Arc::new(Mutex::new(targets));
    let mut tasks = JoinSet::new();

    for worker in 0..workers {
        let ctx = Arc::clone(ctx);
        let queue = Arc::clone(&queue);
        tasks.spawn(async move { ctx.work(worker, queue).await });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Worker task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{share, SqliteStorage};
    use async_trait::async_trait;
    use crate::fetch::FetchRequest;
    use std::collections::HashMap;

    /// Serves canned pages keyed by URL and counts every request
    struct CannedSite {
        method: FetchMethod,
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedSite {
        fn new(method: FetchMethod, pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                method,
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FetchStrategy for CannedSite {
        async fn fetch(&self, request: &FetchRequest) -> FetchResult {
            self.requests.lock().unwrap().push(request.url.clone());
            match self.pages.get(&request.url) {
                Some(body) => FetchResult::Success {
                    final_url: request.url.clone(),
                    status_code: 200,
                    body: body.clone(),
                    method: self.method,
                },
                None => FetchResult::HttpError {
                    status_code: 404,
                    method: self.method,
                },
            }
        }

        fn method(&self) -> FetchMethod {
            self.method
        }
    }

    fn config() -> Config {
        let mut config = Config::with_database(":memory:");
        config.engine.connectivity_check = false;
        config.engine.domain_delay_ms = 0;
        config.engine.retry_backoff_ms = 1;
        config
    }

    fn seeded(urls: &[&str]) -> (SharedStorage, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let project = storage.create_project(1, "acme").unwrap();
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        storage.add_project_urls(project, &urls).unwrap();
        (share(storage), project)
    }

    #[tokio::test]
    async fn test_run_aggregates_internal_pages() {
        let site = CannedSite::new(
            FetchMethod::Direct,
            &[
                (
                    "https://acme.com",
                    r#"<html><body><p>sales@acme.com</p>
                        <footer><a href="/contact">Contact us</a></footer></body></html>"#,
                ),
                (
                    "https://acme.com/contact",
                    r#"<html><head><title>Contact</title></head>
                        <body><a href="mailto:support@acme.com">Mail</a></body></html>"#,
                ),
            ],
        );
        let (storage, project) = seeded(&["acme.com"]);
        let orchestrator = Orchestrator::new(config(), Arc::clone(&storage), site.clone(), None);

        let outcome = orchestrator.start_run(project).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.emails, 2);

        let records = lock_storage(&storage).list_scraped_data(project).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].homepage_url, "https://acme.com");
        assert_eq!(
            records[0].contact_page_url.as_deref(),
            Some("https://acme.com/contact")
        );
        assert_eq!(records[0].internal_links.len(), 2);
        assert_eq!(site.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_homepage_leaves_run_incomplete() {
        let site = CannedSite::new(
            FetchMethod::Direct,
            &[("https://acme.com", "<p>hi@acme.com</p>")],
        );
        let (storage, project) = seeded(&["acme.com", "missing.com"]);
        let orchestrator = Orchestrator::new(config(), Arc::clone(&storage), site, None);

        let outcome = orchestrator.start_run(project).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Incomplete);
        assert_eq!(outcome.processed, 1);

        let stored = lock_storage(&storage).get_project(project).unwrap();
        assert_eq!(stored.status, RunStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_missing_project_is_error() {
        let site = CannedSite::new(FetchMethod::Direct, &[]);
        let (storage, _) = seeded(&[]);
        let orchestrator = Orchestrator::new(config(), storage, site, None);

        assert!(orchestrator.start_run(999).await.is_err());
    }

    #[tokio::test]
    async fn test_pause_before_start_dispatches_nothing() {
        let site = CannedSite::new(FetchMethod::Direct, &[]);
        let (storage, project) = seeded(&["acme.com", "globex.com"]);
        let orchestrator = Orchestrator::new(config(), Arc::clone(&storage), site.clone(), None);
        orchestrator.handle().pause();

        let outcome = orchestrator.start_run(project).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Paused);
        assert!(site.requested().is_empty());
        assert!(lock_storage(&storage).is_paused(project).unwrap());
    }

    #[tokio::test]
    async fn test_pause_does_not_carry_into_next_run() {
        let site = CannedSite::new(
            FetchMethod::Direct,
            &[("https://globex.com", "<p>sales@globex.com</p>")],
        );
        let (storage, first) = seeded(&["acme.com"]);
        let second = {
            let mut storage = lock_storage(&storage);
            let project = storage.create_project(1, "globex").unwrap();
            storage
                .add_project_urls(project, &["globex.com".to_string()])
                .unwrap();
            project
        };
        let orchestrator = Orchestrator::new(config(), Arc::clone(&storage), site.clone(), None);

        orchestrator.handle().pause();
        let paused = orchestrator.start_run(first).await.unwrap();
        assert_eq!(paused.status, RunStatus::Paused);
        assert!(!orchestrator.handle().is_paused());

        let outcome = orchestrator.start_run(second).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.emails, 1);
        assert_eq!(site.requested(), vec!["https://globex.com".to_string()]);
        assert!(!lock_storage(&storage).is_paused(second).unwrap());
    }

    #[tokio::test]
    async fn test_browser_refetch_when_direct_finds_no_emails() {
        let direct = CannedSite::new(
            FetchMethod::Direct,
            &[("https://acme.com", "<div id=\"app\"></div>")],
        );
        let browser = CannedSite::new(
            FetchMethod::Browser,
            &[("https://acme.com", "<p>Write to hello@acme.com</p>")],
        );
        let (storage, project) = seeded(&["acme.com"]);
        let orchestrator = Orchestrator::new(
            config(),
            Arc::clone(&storage),
            direct,
            Some(browser.clone() as Arc<dyn FetchStrategy>),
        );

        let outcome = orchestrator.start_run(project).await.unwrap();
        assert_eq!(outcome.emails, 1);
        assert_eq!(browser.requested(), vec!["https://acme.com".to_string()]);

        let records = lock_storage(&storage).list_scraped_data(project).unwrap();
        assert_eq!(records[0].scrape_method, Some(FetchMethod::Browser));
    }
}
