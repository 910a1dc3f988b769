use serde::Deserialize;

/// Main configuration structure for Contact-Scout
///
/// Every section is optional in the TOML file; omitted keys fall back to
/// the defaults below. Per-user run settings (worker count, timeouts,
/// retries, exclusion patterns) live in storage, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Orchestration behavior
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Number of project URLs pulled from storage per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum spacing between two requests to the same domain (milliseconds)
    #[serde(rename = "domain-delay-ms", default = "default_domain_delay_ms")]
    pub domain_delay_ms: u64,

    /// Unit of the linear retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Whether to wait for internet connectivity before a run
    #[serde(rename = "connectivity-check", default = "default_true")]
    pub connectivity_check: bool,

    /// How long to wait for connectivity before failing the run (seconds)
    #[serde(
        rename = "connectivity-wait-secs",
        default = "default_connectivity_wait_secs"
    )]
    pub connectivity_wait_secs: u64,

    /// Probe URLs; any 200/204/301/302 answer counts as online
    #[serde(rename = "connectivity-urls", default = "default_connectivity_urls")]
    pub connectivity_urls: Vec<String>,
}

/// Direct HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "verify-tls", default = "default_true")]
    pub verify_tls: bool,
}

/// Proxy health testing and eviction
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Endpoint requested through each proxy during health checks
    #[serde(rename = "test-url", default = "default_proxy_test_url")]
    pub test_url: String,

    /// Timeout for the run-start health check (seconds)
    #[serde(rename = "test-timeout-secs", default = "default_proxy_test_timeout")]
    pub test_timeout_secs: u64,

    /// Maximum number of proxies probed at once
    #[serde(rename = "test-concurrency", default = "default_proxy_test_concurrency")]
    pub test_concurrency: usize,

    /// Timeout for the single/all proxy maintenance tests (seconds)
    #[serde(
        rename = "maintenance-timeout-secs",
        default = "default_proxy_maintenance_timeout"
    )]
    pub maintenance_timeout_secs: u64,

    /// Failures after which a proxy is evicted for the rest of the run
    #[serde(rename = "failure-threshold", default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

/// Headless browser fallback
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Navigation timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_browser_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on the wait for the page to stop loading resources (milliseconds)
    #[serde(rename = "network-idle-ms", default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Wait after scrolling to the bottom of the page (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Number of page loads before a worker's browser is relaunched
    #[serde(rename = "recycle-after", default = "default_recycle_after")]
    pub recycle_after: u32,

    /// URL patterns blocked at the network layer
    #[serde(rename = "blocked-patterns", default = "default_blocked_patterns")]
    pub blocked_patterns: Vec<String>,

    /// Chrome/Chromium binary; auto-detected when unset
    #[serde(default)]
    pub executable: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    500
}

fn default_domain_delay_ms() -> u64 {
    500
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_connectivity_wait_secs() -> u64 {
    300
}

fn default_connectivity_urls() -> Vec<String> {
    vec![
        "http://clients3.google.com/generate_204".to_string(),
        "http://www.msftconnecttest.com/connecttest.txt".to_string(),
        "https://example.com/".to_string(),
    ]
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

fn default_proxy_test_url() -> String {
    "http://httpbin.org/ip".to_string()
}

fn default_proxy_test_timeout() -> u64 {
    5
}

fn default_proxy_test_concurrency() -> usize {
    30
}

fn default_proxy_maintenance_timeout() -> u64 {
    10
}

fn default_failure_threshold() -> u32 {
    10
}

fn default_browser_timeout() -> u64 {
    15
}

fn default_network_idle_ms() -> u64 {
    5000
}

fn default_settle_ms() -> u64 {
    500
}

fn default_recycle_after() -> u32 {
    100
}

fn default_blocked_patterns() -> Vec<String> {
    [
        "*.png", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.ico", "*.woff", "*.woff2", "*.ttf",
        "*.eot", "*analytics*", "*tracking*", "*/ads*",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            domain_delay_ms: default_domain_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            connectivity_check: true,
            connectivity_wait_secs: default_connectivity_wait_secs(),
            connectivity_urls: default_connectivity_urls(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            verify_tls: true,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            test_url: default_proxy_test_url(),
            test_timeout_secs: default_proxy_test_timeout(),
            test_concurrency: default_proxy_test_concurrency(),
            maintenance_timeout_secs: default_proxy_maintenance_timeout(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            timeout_secs: default_browser_timeout(),
            network_idle_ms: default_network_idle_ms(),
            settle_ms: default_settle_ms(),
            recycle_after: default_recycle_after(),
            blocked_patterns: default_blocked_patterns(),
            executable: None,
        }
    }
}

impl Config {
    /// Builds a configuration with every default and the given database path
    pub fn with_database(database_path: impl Into<String>) -> Self {
        Self {
            engine: EngineConfig::default(),
            http: HttpConfig::default(),
            proxy: ProxyConfig::default(),
            browser: BrowserConfig::default(),
            output: OutputConfig {
                database_path: database_path.into(),
            },
        }
    }
}
