//! Per-domain rate limiting
//!
//! Every request start for a domain is spaced at least `min_delay` after the
//! previous one, across all workers. A caller reserves its slot under the
//! lock and sleeps outside it, so concurrent callers for the same domain
//! queue up in reservation order instead of all waking at once.

use crate::url::host_of;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Shared clock of the last reserved request start per domain
#[derive(Debug)]
pub struct DomainRateLimiter {
    min_delay: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl DomainRateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Waits until a request to the URL's domain may start
    pub async fn wait_for_domain(&self, url: &str) {
        let slot = self.reserve(&domain_key(url), Instant::now());
        tokio::time::sleep_until(slot).await;
    }

    /// Reserves the next start slot for `domain`: `max(now, last + min_delay)`
    ///
    /// The reservation becomes the domain's new last-request time, so entries
    /// only ever move forward.
    fn reserve(&self, domain: &str, now: Instant) -> Instant {
        let mut last_request = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let slot = match last_request.get(domain) {
            Some(last) => now.max(*last + self.min_delay),
            None => now,
        };
        last_request.insert(domain.to_string(), slot);
        slot
    }

    /// Last reserved request start for a domain
    pub fn last_request(&self, domain: &str) -> Option<Instant> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(domain)
            .copied()
    }
}

/// Domain key used by the limiter; unparseable input is its own key
fn domain_key(url: &str) -> String {
    host_of(url).unwrap_or_else(|| url.to_string())
}
