//! Fetch fallback policy
//!
//! Decides which strategy serves a request:
//!
//! | Direct outcome            | Action                                    |
//! |---------------------------|-------------------------------------------|
//! | Success                   | Return it                                 |
//! | HTTP 403 / 503            | Stop retrying, escalate to the browser    |
//! | Other error or no reply   | Count a proxy failure, back off, retry    |
//! | Retries exhausted         | Escalate to the browser                   |
//! | Browser fails or absent   | Return the last failure                   |
//!
//! Every attempt, direct or browser, first waits on the domain rate limiter.

use crate::crawler::DomainRateLimiter;
use crate::fetch::{FetchRequest, FetchResult, FetchStrategy};
use crate::proxy::ProxyPool;
use std::sync::Arc;
use std::time::Duration;

/// Strategies and shared run resources used to fetch one URL
pub struct FetchPolicy {
    direct: Arc<dyn FetchStrategy>,
    browser: Option<Arc<dyn FetchStrategy>>,
    limiter: Arc<DomainRateLimiter>,
    proxies: Arc<ProxyPool>,
    timeout: Duration,
    backoff: Duration,
}

impl FetchPolicy {
    /// Creates a policy
    ///
    /// # Arguments
    ///
    /// * `direct` - The direct HTTP strategy
    /// * `browser` - The browser strategy, if enabled for this run
    /// * `limiter` - Run-wide domain rate limiter
    /// * `proxies` - Run-wide proxy pool
    /// * `timeout` - Per-request timeout
    /// * `backoff` - Linear backoff unit between direct attempts
    pub fn new(
        direct: Arc<dyn FetchStrategy>,
        browser: Option<Arc<dyn FetchStrategy>>,
        limiter: Arc<DomainRateLimiter>,
        proxies: Arc<ProxyPool>,
        timeout: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            direct,
            browser,
            limiter,
            proxies,
            timeout,
            backoff,
        }
    }

    pub fn has_browser(&self) -> bool {
        self.browser.is_some()
    }

    /// Fetches a URL with retries and browser escalation
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to fetch
    /// * `retries` - Direct attempts before escalating (at least 1)
    /// * `worker` - Id of the calling worker
    pub async fn fetch(&self, url: &str, retries: u32, worker: usize) -> FetchResult {
        let attempts = retries.max(1);
        let mut last_failure = None;

        for attempt in 0..attempts {
            self.limiter.wait_for_domain(url).await;

            let proxy = self.proxies.select();
            let request = FetchRequest::new(url, self.timeout)
                .with_proxy(proxy.clone())
                .with_worker(worker);
            let result = self.direct.fetch(&request).await;

            if result.is_success() {
                return result;
            }

            if result.needs_escalation() {
                tracing::debug!("{} answered {}, escalating", url, result.describe());
                last_failure = Some(result);
                break;
            }

            if let Some(proxy) = &proxy {
                self.proxies.record_failure(proxy);
            }

            tracing::debug!(
                "Direct attempt {}/{} for {} failed: {}",
                attempt + 1,
                attempts,
                url,
                result.describe()
            );
            let retryable = result.is_retryable();
            last_failure = Some(result);

            if !retryable {
                break;
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(self.backoff * (attempt + 1)).await;
            }
        }

        if let Some(result) = self.fetch_with_browser(url, worker).await {
            if !result.is_success() {
                tracing::debug!("Browser fetch for {} failed: {}", url, result.describe());
            }
            return result;
        }

        last_failure.unwrap_or_else(|| FetchResult::Unavailable {
            error: "No fetch attempt was made".to_string(),
        })
    }

    /// Fetches a URL once with the browser strategy
    ///
    /// # Returns
    ///
    /// `None` when no browser strategy is configured for this run
    pub async fn fetch_with_browser(&self, url: &str, worker: usize) -> Option<FetchResult> {
        let browser = self.browser.as_ref()?;

        tracing::info!("Using browser for {}", url);
        self.limiter.wait_for_domain(url).await;
        let request = FetchRequest::new(url, self.timeout).with_worker(worker);
        Some(browser.fetch(&request).await)
    }
}
