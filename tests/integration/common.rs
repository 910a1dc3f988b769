use async_trait::async_trait;
use contact_scout::config::Config;
use contact_scout::fetch::{DirectFetcher, FetchRequest};
use contact_scout::storage::{self, lock_storage, RunSettings, SharedStorage};
use contact_scout::{FetchMethod, FetchResult, FetchStrategy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::ResponseTemplate;

pub const USER: i64 = 1;

/// A database in a temporary directory plus a fast test configuration
pub struct TestEnv {
    _dir: TempDir,
    pub storage: SharedStorage,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("scout.db");
        let storage =
            storage::share(storage::open_storage(&db_path).expect("Failed to open storage"));

        let mut config = Config::with_database(db_path.to_string_lossy());
        config.engine.connectivity_check = false;
        config.engine.domain_delay_ms = 0;
        config.engine.retry_backoff_ms = 10;
        config.browser.enabled = false;

        Self {
            _dir: dir,
            storage,
            config,
        }
    }

    /// Creates a project for `USER` holding the given homepages
    pub fn project(&self, urls: &[String]) -> i64 {
        let mut storage = lock_storage(&self.storage);
        let project_id = storage.create_project(USER, "test").unwrap();
        storage.add_project_urls(project_id, urls).unwrap();
        project_id
    }

    pub fn settings(&self, settings: RunSettings) {
        lock_storage(&self.storage)
            .save_settings(USER, &settings)
            .unwrap();
    }

    pub fn direct(&self) -> Arc<dyn FetchStrategy> {
        Arc::new(DirectFetcher::new(self.config.http.clone()))
    }
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body.to_string())
}

/// Browser stand-in serving canned rendered pages
pub struct ScriptedBrowser {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    pub fn new(pages: &[(String, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.clone(), body.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchStrategy for ScriptedBrowser {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        self.calls.lock().unwrap().push(request.url.clone());
        match self.pages.get(&request.url) {
            Some(body) => FetchResult::Success {
                final_url: request.url.clone(),
                status_code: 200,
                body: body.clone(),
                method: FetchMethod::Browser,
            },
            None => FetchResult::NetworkError {
                error: "page not scripted".to_string(),
                method: FetchMethod::Browser,
                timeout: false,
            },
        }
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Browser
    }
}

/// Direct strategy that raises the stored pause flag when it sees a URL
pub struct PausingFetcher {
    inner: DirectFetcher,
    storage: SharedStorage,
    project_id: i64,
    trigger: String,
}

impl PausingFetcher {
    pub fn new(env: &TestEnv, project_id: i64, trigger: String) -> Arc<Self> {
        Arc::new(Self {
            inner: DirectFetcher::new(env.config.http.clone()),
            storage: Arc::clone(&env.storage),
            project_id,
            trigger,
        })
    }
}

#[async_trait]
impl FetchStrategy for PausingFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        if request.url == self.trigger {
            lock_storage(&self.storage)
                .set_paused(self.project_id, true)
                .unwrap();
        }
        self.inner.fetch(request).await
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Direct
    }
}
