//! Proxy health tests
//!
//! A proxy is working when a GET through it to the probe URL answers 200
//! within the timeout. Startup tests fan out with bounded concurrency.

use crate::config::HttpConfig;
use crate::fetch::build_http_client;
use futures::stream::{self, StreamExt};
use std::time::Duration;

/// Probes a single proxy
///
/// # Arguments
///
/// * `proxy_url` - Proxy to route the probe through
/// * `probe_url` - URL fetched through the proxy
/// * `timeout` - Bound on the whole probe request
/// * `http` - Client settings (user agent, TLS verification)
///
/// # Returns
///
/// `true` if the probe answered HTTP 200
pub async fn test_proxy(
    proxy_url: &str,
    probe_url: &str,
    timeout: Duration,
    http: &HttpConfig,
) -> bool {
    let client = match build_http_client(http, Some(proxy_url)) {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!("Invalid proxy {}: {}", proxy_url, e);
            return false;
        }
    };

    match client.get(probe_url).timeout(timeout).send().await {
        Ok(response) => response.status().as_u16() == 200,
        Err(e) => {
            tracing::debug!("Proxy {} failed probe: {}", proxy_url, e);
            false
        }
    }
}

/// Probes every candidate concurrently and returns the working subset
///
/// Order of the result follows completion, not input order.
pub async fn test_all(
    candidates: Vec<String>,
    concurrency: usize,
    timeout: Duration,
    probe_url: &str,
    http: &HttpConfig,
) -> Vec<String> {
    stream::iter(candidates)
        .map(|proxy| async move {
            let ok = test_proxy(&proxy, probe_url, timeout, http).await;
            (proxy, ok)
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(proxy, ok)| async move { ok.then_some(proxy) })
        .collect()
        .await
}
