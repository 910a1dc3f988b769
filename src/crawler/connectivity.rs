//! Internet connectivity precheck
//!
//! Before a run starts, the orchestrator can wait for the network to come
//! back. Probe URLs are tried in order without following redirects; any
//! 200, 204, 301 or 302 answer counts as online.

use crate::{Result, ScoutError};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tokio::time::Instant;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Delay between two probe rounds
pub const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Tries each probe URL once
///
/// # Returns
///
/// `true` as soon as one probe answers with an online status
pub async fn is_online(client: &Client, urls: &[String]) -> bool {
    for url in urls {
        match client.get(url).send().await {
            Ok(response) if matches!(response.status().as_u16(), 200 | 204 | 301 | 302) => {
                return true
            }
            Ok(response) => {
                tracing::debug!("Probe {} answered {}", url, response.status());
            }
            Err(e) => {
                tracing::debug!("Probe {} failed: {}", url, e);
            }
        }
    }
    false
}

/// Waits until a probe succeeds or `max_wait` elapses
///
/// # Arguments
///
/// * `urls` - Probe URLs
/// * `max_wait` - Total time to keep probing
/// * `interval` - Pause between probe rounds
///
/// # Returns
///
/// * `Ok(())` - The network is reachable
/// * `Err(ScoutError::NoConnectivity)` - No probe succeeded in time
pub async fn wait_for_connectivity(
    urls: &[String],
    max_wait: Duration,
    interval: Duration,
) -> Result<()> {
    let client = Client::builder()
        .timeout(PROBE_TIMEOUT)
        .redirect(Policy::none())
        .build()?;

    let start = Instant::now();
    loop {
        if is_online(&client, urls).await {
            return Ok(());
        }

        let waited = start.elapsed();
        if waited >= max_wait {
            return Err(ScoutError::NoConnectivity {
                waited_secs: waited.as_secs(),
            });
        }

        tracing::warn!(
            "No internet connectivity, retrying in {}s ({}s waited)",
            interval.as_secs(),
            waited.as_secs()
        );
        tokio::time::sleep(interval.min(max_wait - waited)).await;
    }
}
