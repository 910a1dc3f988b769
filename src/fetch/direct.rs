//! Direct HTTP strategy
//!
//! Plain `reqwest` requests with browser-like headers:
//! - One client per proxy, built lazily and cached
//! - Redirects followed (max 10 hops)
//! - gzip/brotli decoding
//! - TLS verification per configuration
//! - 4xx/5xx answers reported as `HttpError`

use crate::config::HttpConfig;
use crate::fetch::{FetchMethod, FetchRequest, FetchResult, FetchStrategy};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with browser-like defaults
///
/// # Arguments
///
/// * `config` - The HTTP configuration (user agent, TLS verification)
/// * `proxy` - Optional proxy URL applied to all schemes
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy URL or TLS backend failure
pub fn build_http_client(config: &HttpConfig, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(!config.verify_tls)
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Fetch strategy backed by `reqwest`
pub struct DirectFetcher {
    config: HttpConfig,
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl DirectFetcher {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
        let key = proxy.map(str::to_string);
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_http_client(&self.config, proxy)?;
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl FetchStrategy for DirectFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        let client = match self.client_for(request.proxy.as_deref()) {
            Ok(client) => client,
            Err(e) => {
                // A malformed proxy URL counts against the proxy, not the strategy
                return FetchResult::NetworkError {
                    error: format!("Failed to build client: {}", e),
                    method: FetchMethod::Direct,
                    timeout: false,
                };
            }
        };

        let response = match client.get(&request.url).timeout(request.timeout).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
                method: FetchMethod::Direct,
            };
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
                method: FetchMethod::Direct,
            },
            Err(e) => classify_error(e),
        }
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Direct
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };

    FetchResult::NetworkError {
        error,
        method: FetchMethod::Direct,
        timeout: e.is_timeout(),
    }
}
