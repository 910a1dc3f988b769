use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory view of a run shared by every worker
///
/// The stored project row stays authoritative; these counters mirror what
/// was last written so progress can be logged without a query.
#[derive(Debug, Default)]
pub struct RunState {
    paused: AtomicBool,
    total: AtomicU64,
    processed: AtomicU64,
    emails: AtomicU64,
}

impl RunState {
    pub fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            ..Self::default()
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn emails(&self) -> u64 {
        self.emails.load(Ordering::Relaxed)
    }

    /// Replaces the counters with freshly recomputed values
    pub fn set_progress(&self, processed: u64, emails: u64) {
        self.processed.store(processed, Ordering::Relaxed);
        self.emails.store(emails, Ordering::Relaxed);
    }

    /// Integer percentage of processed homepages, 0 when total is 0
    pub fn progress_percent(&self) -> u32 {
        progress_percent(self.processed(), self.total())
    }

    /// Clears the pause flag and counters once a run has ended
    pub fn reset(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.total.store(0, Ordering::Relaxed);
        self.set_progress(0, 0);
    }
}

/// Integer percentage `processed * 100 / total`, capped at 100
pub fn progress_percent(processed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (processed.saturating_mul(100) / total).min(100) as u32
}

/// Cloneable handle for pausing a run from outside the orchestrator
#[derive(Debug, Clone)]
pub struct RunHandle {
    state: Arc<RunState>,
}

impl RunHandle {
    pub(crate) fn new(state: Arc<RunState>) -> Self {
        Self { state }
    }

    /// Requests a cooperative pause; workers stop before their next homepage
    pub fn pause(&self) {
        self.state.pause();
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn progress_percent(&self) -> u32 {
        self.state.progress_percent()
    }
}
