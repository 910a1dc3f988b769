//! Proxy module
//!
//! - `ProxyPool`: run-scoped set of working proxies with failure-based eviction
//! - `test_proxy` / `test_all`: probes used to filter candidates at run start
//! - `test_single_proxy` / `test_all_proxies`: maintenance tests that persist
//!   their verdict

mod maintenance;
mod pool;
mod tester;

pub use maintenance::{test_all_proxies, test_single_proxy, ProxyTestReport};
pub use pool::{ProxyEntry, ProxyPool};
pub use tester::{test_all, test_proxy};
