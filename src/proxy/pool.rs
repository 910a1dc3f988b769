use rand::seq::SliceRandom;
use std::sync::Mutex;

/// One proxy known to a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    pub url: String,
    pub is_active: bool,
    pub failure_count: u32,
}

impl ProxyEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_active: true,
            failure_count: 0,
        }
    }
}

/// Run-scoped pool of working proxies shared by all workers
///
/// A proxy that reaches the failure threshold is evicted for the rest of the
/// run; eviction is never undone.
#[derive(Debug)]
pub struct ProxyPool {
    entries: Mutex<Vec<ProxyEntry>>,
    threshold: u32,
    enabled: bool,
}

impl ProxyPool {
    /// Creates a pool from the proxies that passed the startup health test
    ///
    /// # Arguments
    ///
    /// * `urls` - Working proxy URLs
    /// * `threshold` - Failures after which a proxy is evicted (at least 1)
    pub fn new(urls: Vec<String>, threshold: u32) -> Self {
        Self {
            entries: Mutex::new(urls.into_iter().map(ProxyEntry::new).collect()),
            threshold: threshold.max(1),
            enabled: true,
        }
    }

    /// A pool that never hands out a proxy
    pub fn disabled() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            threshold: 1,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Picks a uniformly random active proxy, or None for a direct connection
    pub fn select(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let entries = self.lock();
        let active: Vec<&ProxyEntry> = entries.iter().filter(|e| e.is_active).collect();
        active
            .choose(&mut rand::thread_rng())
            .map(|entry| entry.url.clone())
    }

    /// Counts a failed attempt against `url`
    ///
    /// # Returns
    ///
    /// `true` if this failure evicted the proxy
    pub fn record_failure(&self, url: &str) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.iter_mut().find(|e| e.url == url) else {
            return false;
        };

        entry.failure_count += 1;
        if entry.is_active && entry.failure_count >= self.threshold {
            entry.is_active = false;
            tracing::warn!(
                "Removed failing proxy {} after {} failures",
                url,
                entry.failure_count
            );
            return true;
        }
        false
    }

    pub fn active_count(&self) -> usize {
        self.lock().iter().filter(|e| e.is_active).count()
    }

    /// Snapshot of every entry, active or evicted
    pub fn entries(&self) -> Vec<ProxyEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProxyEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
