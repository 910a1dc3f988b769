//! Fetch layer
//!
//! Two interchangeable strategies behind one async trait:
//! - `DirectFetcher`: fast HTTP requests through an optional proxy
//! - `BrowserFetcher`: headless Chrome rendering for script-heavy or
//!   bot-protected sites
//!
//! Strategies never retry; retries and escalation belong to the fallback
//! policy in the crawler module.

mod browser;
mod direct;
mod result;
mod traits;

pub use browser::{BrowserFetcher, BrowserPool};
pub use direct::{build_http_client, DirectFetcher};
pub use result::{FetchMethod, FetchRequest, FetchResult};
pub use traits::FetchStrategy;
