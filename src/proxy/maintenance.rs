//! Maintenance health tests over stored proxies
//!
//! Unlike the startup test, these persist their verdict: `is_active` and
//! `last_tested` are written back for every proxy probed.

use crate::config::Config;
use crate::proxy::test_proxy;
use crate::storage::{lock_storage as lock, SharedStorage};
use crate::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Duration;

/// Verdict for one stored proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTestReport {
    pub proxy_id: i64,
    pub url: String,
    pub is_active: bool,
    pub tested_at: DateTime<Utc>,
}

/// Tests one stored proxy and records the verdict
///
/// # Arguments
///
/// * `storage` - Shared storage handle
/// * `config` - Engine configuration (probe URL, maintenance timeout)
/// * `proxy_id` - The proxy to test
///
/// # Returns
///
/// * `Ok(ProxyTestReport)` - The proxy was probed and updated
/// * `Err(ScoutError)` - The proxy does not exist or storage failed
pub async fn test_single_proxy(
    storage: &SharedStorage,
    config: &Config,
    proxy_id: i64,
) -> Result<ProxyTestReport> {
    let proxy = lock(storage).get_proxy(proxy_id)?;
    let timeout = Duration::from_secs(config.proxy.maintenance_timeout_secs);

    let is_active = test_proxy(&proxy.proxy_url, &config.proxy.test_url, timeout, &config.http).await;
    let tested_at = Utc::now();
    lock(storage).record_proxy_test(proxy_id, is_active, tested_at)?;

    tracing::info!(
        "Proxy {} ({}) is {}",
        proxy_id,
        proxy.proxy_url,
        if is_active { "working" } else { "not working" }
    );

    Ok(ProxyTestReport {
        proxy_id,
        url: proxy.proxy_url,
        is_active,
        tested_at,
    })
}

/// Tests every stored proxy of a user concurrently and records each verdict
///
/// # Returns
///
/// One report per proxy, ordered by proxy ID
pub async fn test_all_proxies(
    storage: &SharedStorage,
    config: &Config,
    user_id: i64,
) -> Result<Vec<ProxyTestReport>> {
    let proxies = lock(storage).get_user_proxies(user_id)?;
    let timeout = Duration::from_secs(config.proxy.maintenance_timeout_secs);
    let probe_url = config.proxy.test_url.as_str();
    let http = &config.http;

    tracing::info!("Testing {} proxies for user {}", proxies.len(), user_id);

    let verdicts: Vec<(i64, String, bool)> = stream::iter(proxies)
        .map(|proxy| async move {
            let ok = test_proxy(&proxy.proxy_url, probe_url, timeout, http).await;
            (proxy.id, proxy.proxy_url, ok)
        })
        .buffer_unordered(config.proxy.test_concurrency.max(1))
        .collect()
        .await;

    let tested_at = Utc::now();
    let mut reports = Vec::with_capacity(verdicts.len());
    {
        let mut storage = lock(storage);
        for (proxy_id, url, is_active) in verdicts {
            storage.record_proxy_test(proxy_id, is_active, tested_at)?;
            reports.push(ProxyTestReport {
                proxy_id,
                url,
                is_active,
                tested_at,
            });
        }
    }
    reports.sort_by_key(|r| r.proxy_id);

    let working = reports.iter().filter(|r| r.is_active).count();
    tracing::info!("{}/{} proxies working", working, reports.len());

    Ok(reports)
}
