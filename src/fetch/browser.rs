//! Headless-browser strategy
//!
//! Renders pages with Chrome through `chromiumoxide`. Each worker owns one
//! browser slot in a `BrowserPool`; the browser is launched lazily, recycled
//! after a fixed number of uses and closed on `shutdown`.
//!
//! # Page flow
//!
//! 1. Open a blank page and block images, fonts and tracker URLs
//! 2. Override the user agent
//! 3. Navigate (bounded by the request timeout)
//! 4. Poll until the document is complete and resource loads stop (bounded)
//! 5. Scroll to the bottom to trigger lazy content, then settle briefly
//! 6. Capture the rendered HTML and the final URL
//! 7. Close the page on every path

use crate::config::BrowserConfig;
use crate::fetch::{FetchMethod, FetchRequest, FetchResult, FetchStrategy};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Chromium does not surface the document status on `goto`
const RENDERED_STATUS: u16 = 200;

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Returns `[readyState, resource entry count]`
const LOAD_STATE_SCRIPT: &str =
    "[document.readyState, performance.getEntriesByType('resource').length]";

const IDLE_POLL: Duration = Duration::from_millis(250);

/// Decides when a page has stopped loading
///
/// The page counts as idle once the document is complete and the number of
/// loaded resources has not changed between two consecutive polls.
#[derive(Debug, Default)]
struct IdleTracker {
    last_resources: Option<u64>,
}

impl IdleTracker {
    fn observe(&mut self, ready_state: &str, resources: u64) -> bool {
        let quiet = self.last_resources == Some(resources);
        self.last_resources = Some(resources);
        ready_state == "complete" && quiet
    }
}

/// One worker's browser
#[derive(Default)]
struct BrowserSlot {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    uses: u32,
}

impl BrowserSlot {
    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.uses = 0;
    }
}

/// Per-worker browser instances
pub struct BrowserPool {
    config: BrowserConfig,
    slots: Mutex<HashMap<usize, Arc<tokio::sync::Mutex<BrowserSlot>>>>,
}

impl BrowserPool {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, worker: usize) -> Arc<tokio::sync::Mutex<BrowserSlot>> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(slots.entry(worker).or_default())
    }

    /// Number of workers that have claimed a slot
    pub fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), String> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(1920, 1080)
            .request_timeout(Duration::from_secs(self.config.timeout_secs));

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.executable {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder.build()?;
        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| e.to_string())?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task))
    }

    /// Closes every browser in the pool
    pub async fn close_all(&self) {
        let slots: Vec<_> = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slots.drain().map(|(_, slot)| slot).collect()
        };

        for slot in slots {
            slot.lock().await.close().await;
        }
    }
}

/// Fetch strategy backed by a headless browser
pub struct BrowserFetcher {
    pool: BrowserPool,
    user_agent: String,
}

impl BrowserFetcher {
    pub fn new(config: BrowserConfig, user_agent: impl Into<String>) -> Self {
        Self {
            pool: BrowserPool::new(config),
            user_agent: user_agent.into(),
        }
    }

    pub fn pool(&self) -> &BrowserPool {
        &self.pool
    }

    async fn render(&self, page: &Page, request: &FetchRequest) -> FetchResult {
        let config = &self.pool.config;

        if let Err(e) = page.execute(EnableParams::default()).await {
            tracing::debug!("Failed to enable network domain for {}: {}", request.url, e);
        }
        if !config.blocked_patterns.is_empty() {
            let blocked = SetBlockedUrLsParams::new(config.blocked_patterns.clone());
            if let Err(e) = page.execute(blocked).await {
                tracing::debug!("Failed to block resources for {}: {}", request.url, e);
            }
        }
        if let Err(e) = page.set_user_agent(self.user_agent.clone()).await {
            tracing::debug!("Failed to set user agent for {}: {}", request.url, e);
        }

        let nav_timeout = request.timeout.min(Duration::from_secs(config.timeout_secs));
        match tokio::time::timeout(nav_timeout, page.goto(&request.url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return FetchResult::NetworkError {
                    error: e.to_string(),
                    method: FetchMethod::Browser,
                    timeout: false,
                }
            }
            Err(_) => {
                return FetchResult::NetworkError {
                    error: format!("Navigation exceeded {:?}", nav_timeout),
                    method: FetchMethod::Browser,
                    timeout: true,
                }
            }
        }

        let idle_limit = Duration::from_millis(config.network_idle_ms);
        if tokio::time::timeout(idle_limit, wait_for_idle(page))
            .await
            .is_err()
        {
            tracing::debug!(
                "{} still loading after {:?}, capturing anyway",
                request.url,
                idle_limit
            );
        }

        if let Err(e) = page.evaluate(SCROLL_SCRIPT).await {
            tracing::debug!("Scroll failed for {}: {}", request.url, e);
        }
        tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;

        let body = match page.content().await {
            Ok(body) => body,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: format!("Failed to read content: {}", e),
                    method: FetchMethod::Browser,
                    timeout: false,
                }
            }
        };
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| request.url.clone());

        FetchResult::Success {
            final_url,
            status_code: RENDERED_STATUS,
            body,
            method: FetchMethod::Browser,
        }
    }
}

/// Polls the page until `IdleTracker` reports it quiet
///
/// Evaluation errors end the wait early; the caller bounds it in time.
async fn wait_for_idle(page: &Page) {
    let mut tracker = IdleTracker::default();
    loop {
        let state = match page.evaluate(LOAD_STATE_SCRIPT).await {
            Ok(result) => result.into_value::<(String, u64)>(),
            Err(e) => {
                tracing::debug!("Load state check failed: {}", e);
                return;
            }
        };
        match state {
            Ok((ready_state, resources)) => {
                if tracker.observe(&ready_state, resources) {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!("Unexpected load state value: {}", e);
                return;
            }
        }
        tokio::time::sleep(IDLE_POLL).await;
    }
}

#[async_trait]
impl FetchStrategy for BrowserFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        let slot = self.pool.slot(request.worker);
        let mut slot = slot.lock().await;

        if slot.browser.is_some() && slot.uses >= self.pool.config.recycle_after {
            tracing::debug!(
                "Recycling browser for worker {} after {} pages",
                request.worker,
                slot.uses
            );
            slot.close().await;
        }

        if slot.browser.is_none() {
            match self.pool.launch().await {
                Ok((browser, handler)) => {
                    slot.browser = Some(browser);
                    slot.handler = Some(handler);
                    slot.uses = 0;
                }
                Err(e) => {
                    tracing::warn!("Failed to launch browser: {}", e);
                    return FetchResult::Unavailable { error: e };
                }
            }
        }

        let Some(browser) = slot.browser.as_ref() else {
            return FetchResult::Unavailable {
                error: "Browser slot is empty".to_string(),
            };
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // The browser process is likely gone; relaunch on next use
                slot.close().await;
                return FetchResult::NetworkError {
                    error: format!("Failed to open page: {}", e),
                    method: FetchMethod::Browser,
                    timeout: false,
                };
            }
        };
        slot.uses += 1;

        let result = self.render(&page, request).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", request.url, e);
        }

        result
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Browser
    }

    async fn shutdown(&self) {
        let workers = self.pool.slot_count();
        self.pool.close_all().await;
        if workers > 0 {
            tracing::info!("Closed browsers for {} worker(s)", workers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_per_worker() {
        let pool = BrowserPool::new(BrowserConfig::default());
        let a = pool.slot(0);
        let b = pool.slot(0);
        let c = pool.slot(1);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.slot_count(), 2);
    }

    #[test]
    fn test_idle_needs_complete_document_and_stable_resources() {
        let mut tracker = IdleTracker::default();
        assert!(!tracker.observe("complete", 4));
        assert!(!tracker.observe("complete", 7));
        assert!(tracker.observe("complete", 7));

        let mut tracker = IdleTracker::default();
        assert!(!tracker.observe("interactive", 3));
        assert!(!tracker.observe("interactive", 3));
        assert!(tracker.observe("complete", 3));
    }

    #[test]
    fn test_fetcher_keeps_configured_user_agent() {
        let fetcher = BrowserFetcher::new(BrowserConfig::default(), "Mozilla/5.0 scout");
        assert_eq!(fetcher.user_agent, "Mozilla/5.0 scout");
        assert_eq!(fetcher.method(), FetchMethod::Browser);
    }

    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let config = BrowserConfig {
            executable: Some("/nonexistent/chrome-binary".to_string()),
            ..BrowserConfig::default()
        };
        let fetcher = BrowserFetcher::new(config, "test-agent");
        let request = FetchRequest::new("https://acme.com", Duration::from_secs(5));

        let result = fetcher.fetch(&request).await;
        assert!(matches!(result, FetchResult::Unavailable { .. }));

        fetcher.shutdown().await;
        assert_eq!(fetcher.pool().slot_count(), 0);
    }
}
