use std::fmt;
use std::time::Duration;

/// Which strategy produced a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMethod {
    /// Plain HTTP client request
    Direct,
    /// Headless browser rendering
    Browser,
}

impl FetchMethod {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Direct => "requests",
            Self::Browser => "browser",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "requests" => Some(Self::Direct),
            "browser" => Some(Self::Browser),
            _ => None,
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// One request handed to a fetch strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Proxy URL for this attempt; browser fetches ignore it
    pub proxy: Option<String>,
    pub timeout: Duration,
    /// Id of the worker issuing the request, used to pick a browser slot
    pub worker: usize,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            proxy: None,
            timeout,
            worker: 0,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = worker;
        self
    }
}

/// Outcome of a single fetch attempt
///
/// Failures are values: callers decide whether to retry, escalate or give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// A page body was retrieved
    Success {
        /// URL after redirects
        final_url: String,
        status_code: u16,
        body: String,
        method: FetchMethod,
    },

    /// The server answered with a 4xx/5xx status
    HttpError { status_code: u16, method: FetchMethod },

    /// No response was received (connect, TLS, timeout, proxy failure)
    NetworkError {
        error: String,
        method: FetchMethod,
        timeout: bool,
    },

    /// The strategy cannot run at all (e.g. the browser failed to launch)
    Unavailable { error: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true for 403/503 answers, the usual shape of a bot challenge
    pub fn needs_escalation(&self) -> bool {
        matches!(
            self,
            Self::HttpError {
                status_code: 403 | 503,
                ..
            }
        )
    }

    /// Returns true if another direct attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError { .. } => !self.needs_escalation(),
            Self::NetworkError { .. } => true,
            Self::Success { .. } | Self::Unavailable { .. } => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } | Self::HttpError { status_code, .. } => {
                Some(*status_code)
            }
            Self::NetworkError { .. } | Self::Unavailable { .. } => None,
        }
    }

    pub fn method(&self) -> Option<FetchMethod> {
        match self {
            Self::Success { method, .. }
            | Self::HttpError { method, .. }
            | Self::NetworkError { method, .. } => Some(*method),
            Self::Unavailable { .. } => None,
        }
    }

    /// Short human-readable description for log lines
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::HttpError { status_code, .. } => format!("HTTP {}", status_code),
            Self::NetworkError {
                timeout: true,
                error,
                ..
            } => format!("timeout ({})", error),
            Self::NetworkError { error, .. } => error.clone(),
            Self::Unavailable { error } => format!("unavailable ({})", error),
        }
    }
}
