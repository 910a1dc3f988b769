//! Crawler module for run orchestration
//!
//! This module contains the core scraping logic, including:
//! - Per-domain rate limiting shared by every worker
//! - The direct/browser fallback policy with retries
//! - Internal-link crawl set selection
//! - Per-homepage aggregation of findings
//! - Overall run coordination

mod connectivity;
mod crawl_set;
mod orchestrator;
mod policy;
mod rate_limiter;
mod record;

pub use connectivity::{is_online, wait_for_connectivity, PROBE_INTERVAL};
pub use crawl_set::build_crawl_list;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use policy::FetchPolicy;
pub use rate_limiter::DomainRateLimiter;
pub use record::AggregatedRecord;
