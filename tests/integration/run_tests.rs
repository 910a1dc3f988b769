use crate::common::{html, PausingFetcher, ScriptedBrowser, TestEnv, USER};
use contact_scout::crawler::AggregatedRecord;
use contact_scout::extract::PageExtraction;
use contact_scout::storage::{lock_storage, RunSettings};
use contact_scout::{FetchMethod, FetchStrategy, Orchestrator, RunStatus};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts one single-page site per path, each with a distinct email
async fn mount_sites(server: &MockServer, sites: &[&str]) -> Vec<String> {
    let mut urls = Vec::new();
    for site in sites {
        Mock::given(method("GET"))
            .and(path(format!("/{}", site)))
            .respond_with(html(&format!("<p>Reach us at office@{}.com</p>", site)))
            .mount(server)
            .await;
        urls.push(format!("{}/{}", server.uri(), site));
    }
    urls
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test]
async fn test_run_completes_and_records_progress() {
    let server = MockServer::start().await;
    let urls = mount_sites(&server, &["acme", "globex", "initech"]).await;

    let env = TestEnv::new();
    let project_id = env.project(&urls);

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None)
        .with_config_hash("abc123");
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.processed, 3);
    assert_eq!(outcome.emails, 3);

    let storage = lock_storage(&env.storage);
    let project = storage.get_project(project_id).unwrap();
    assert_eq!(project.status, RunStatus::Completed);
    assert_eq!(project.progress, 100);
    assert!(project.completed_at.is_some());

    let run = storage.get_latest_run(project_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "abc123");
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_resume_fetches_only_unscraped_homepages() {
    let server = MockServer::start().await;
    let urls = mount_sites(&server, &["acme", "globex", "initech", "umbrella"]).await;

    let env = TestEnv::new();
    let project_id = env.project(&urls);

    // Two homepages already have results from an earlier run
    {
        let mut storage = lock_storage(&env.storage);
        for url in &urls[..2] {
            let record = AggregatedRecord::from_homepage(
                url.as_str(),
                PageExtraction::default(),
                Some(200),
                FetchMethod::Direct,
            );
            storage.insert_scraped_data(project_id, &record).unwrap();
        }
    }

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None);
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(request_count(&server).await, 2);
    assert_eq!(outcome.processed, 4);
    assert_eq!(outcome.status, RunStatus::Completed);

    let records = lock_storage(&env.storage)
        .list_scraped_data(project_id)
        .unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_pause_stops_dispatch_but_keeps_inflight_record() {
    let server = MockServer::start().await;
    let urls = mount_sites(&server, &["acme", "globex", "initech"]).await;

    let mut env = TestEnv::new();
    env.config.engine.batch_size = 1;
    let project_id = env.project(&urls);

    let direct = PausingFetcher::new(&env, project_id, urls[0].clone());
    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), direct, None);
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Paused);
    assert_eq!(request_count(&server).await, 1);

    let storage = lock_storage(&env.storage);
    let records = storage.list_scraped_data(project_id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].homepage_url, urls[0]);

    let project = storage.get_project(project_id).unwrap();
    assert_eq!(project.status, RunStatus::Paused);
    assert!(project.paused);
    assert_eq!(project.processed_urls, 1);
}

#[tokio::test]
async fn test_internal_links_truncated_by_category_priority() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <main>
                    <p>Sales: sales@acme-corp.com</p>
                    <a href="/pricing">Pricing</a>
                    <a href="/services">Services</a>
                </main>
                <footer>
                    <a href="/imprint">Imprint</a>
                    <a href="/contact">Get in touch</a>
                </footer>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html(
            r#"<html><head><title>Contact</title></head><body>
                <a href="mailto:office@acme-corp.com?subject=Hi">Write to us</a>
                <a href="https://www.linkedin.com/company/acme-corp">LinkedIn</a>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/imprint"))
        .respond_with(html("<p>Legal: legal@acme-corp.com</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(html("<p>never fetched</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    env.settings(RunSettings {
        max_internal_links: 2,
        ..RunSettings::default()
    });
    let project_id = env.project(&[base.clone()]);

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None);
    let outcome = orchestrator.start_run(project_id).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);

    let records = lock_storage(&env.storage)
        .list_scraped_data(project_id)
        .unwrap();
    let record = &records[0];

    assert_eq!(
        record.internal_links,
        vec![
            base.clone(),
            format!("{}/contact", base),
            format!("{}/imprint", base)
        ]
    );
    assert_eq!(
        record.emails,
        vec![
            "legal@acme-corp.com".to_string(),
            "office@acme-corp.com".to_string(),
            "sales@acme-corp.com".to_string()
        ]
    );
    assert_eq!(
        record.contact_page_url.as_deref(),
        Some(format!("{}/contact", base).as_str())
    );
    assert_eq!(record.http_status, Some(200));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_bot_challenge_escalates_to_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let homepage = format!("{}/shop", server.uri());
    let project_id = env.project(&[homepage.clone()]);

    let browser = ScriptedBrowser::new(&[(homepage.clone(), "<p>shop@acme-corp.com</p>")]);
    let orchestrator = Orchestrator::new(
        env.config.clone(),
        Arc::clone(&env.storage),
        env.direct(),
        Some(browser.clone() as Arc<dyn FetchStrategy>),
    );
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(outcome.emails, 1);
    // A challenge is not retried directly
    assert_eq!(request_count(&server).await, 1);
    assert_eq!(browser.calls(), vec![homepage]);

    let records = lock_storage(&env.storage)
        .list_scraped_data(project_id)
        .unwrap();
    assert_eq!(records[0].scrape_method, Some(FetchMethod::Browser));
}

#[tokio::test]
async fn test_empty_homepage_is_rendered_in_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(html(r#"<div id="root"></div><script src="/bundle.js"></script>"#))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let homepage = format!("{}/app", server.uri());
    let project_id = env.project(&[homepage.clone()]);

    let browser = ScriptedBrowser::new(&[(
        homepage.clone(),
        r#"<div id="root"><footer>hello@acme-corp.com</footer></div>"#,
    )]);
    let orchestrator = Orchestrator::new(
        env.config.clone(),
        Arc::clone(&env.storage),
        env.direct(),
        Some(browser.clone() as Arc<dyn FetchStrategy>),
    );
    orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(browser.calls().len(), 1);
    let records = lock_storage(&env.storage)
        .list_scraped_data(project_id)
        .unwrap();
    assert_eq!(records[0].emails, vec!["hello@acme-corp.com".to_string()]);
    assert_eq!(records[0].scrape_method, Some(FetchMethod::Browser));
}

#[tokio::test]
async fn test_failed_homepages_leave_run_incomplete() {
    let server = MockServer::start().await;
    let mut urls = mount_sites(&server, &["acme"]).await;
    urls.push(format!("{}/gone", server.uri()));

    let env = TestEnv::new();
    env.settings(RunSettings {
        max_retries: 2,
        ..RunSettings::default()
    });
    let project_id = env.project(&urls);

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None);
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Incomplete);
    assert_eq!(outcome.processed, 1);
    // One fetch for the live site, two attempts for the missing one
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_unreachable_proxies_are_dropped_for_the_run() {
    let server = MockServer::start().await;
    let urls = mount_sites(&server, &["acme"]).await;

    let mut env = TestEnv::new();
    env.config.proxy.test_url = format!("{}/probe", server.uri());
    env.config.proxy.test_timeout_secs = 1;
    env.settings(RunSettings {
        use_proxies: true,
        ..RunSettings::default()
    });
    lock_storage(&env.storage)
        .add_proxy(USER, "http://127.0.0.1:1", "http")
        .unwrap();
    let project_id = env.project(&urls);

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None);
    let outcome = orchestrator.start_run(project_id).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.emails, 1);
}

#[tokio::test]
async fn test_no_connectivity_marks_run_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut env = TestEnv::new();
    env.config.engine.connectivity_check = true;
    env.config.engine.connectivity_urls = vec![server.uri()];
    env.config.engine.connectivity_wait_secs = 0;
    let project_id = env.project(&["https://acme-corp.com".to_string()]);

    let orchestrator = Orchestrator::new(env.config.clone(), Arc::clone(&env.storage), env.direct(), None);
    assert!(orchestrator.start_run(project_id).await.is_err());

    let storage = lock_storage(&env.storage);
    assert_eq!(
        storage.get_project(project_id).unwrap().status,
        RunStatus::Error
    );
    let run = storage.get_latest_run(project_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Error);
}
