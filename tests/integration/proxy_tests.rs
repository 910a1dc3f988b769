use crate::common::{TestEnv, USER};
use contact_scout::proxy::{test_all, test_all_proxies, test_proxy, test_single_proxy};
use contact_scout::storage::lock_storage;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A wiremock server answering every request works as a forward proxy
async fn proxy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"origin": "10.0.0.1"}"#))
        .mount(&server)
        .await;
    server
}

fn maintenance_env() -> TestEnv {
    let mut env = TestEnv::new();
    env.config.proxy.test_url = "http://probe.invalid/ip".to_string();
    env.config.proxy.maintenance_timeout_secs = 2;
    env
}

#[tokio::test]
async fn test_probe_through_working_and_dead_proxies() {
    let server = proxy_server().await;
    let env = maintenance_env();
    let timeout = Duration::from_secs(2);

    assert!(test_proxy(&server.uri(), &env.config.proxy.test_url, timeout, &env.config.http).await);
    assert!(
        !test_proxy("http://127.0.0.1:1", &env.config.proxy.test_url, timeout, &env.config.http)
            .await
    );

    let working = test_all(
        vec![server.uri(), "http://127.0.0.1:1".to_string()],
        4,
        timeout,
        &env.config.proxy.test_url,
        &env.config.http,
    )
    .await;
    assert_eq!(working, vec![server.uri()]);
}

#[tokio::test]
async fn test_single_proxy_records_verdict() {
    let server = proxy_server().await;
    let env = maintenance_env();
    let proxy_id = lock_storage(&env.storage)
        .add_proxy(USER, &server.uri(), "http")
        .unwrap();

    let report = test_single_proxy(&env.storage, &env.config, proxy_id)
        .await
        .unwrap();
    assert!(report.is_active);
    assert_eq!(report.proxy_id, proxy_id);

    let stored = lock_storage(&env.storage).get_proxy(proxy_id).unwrap();
    assert!(stored.is_active);
    assert!(stored.last_tested.is_some());
}

#[tokio::test]
async fn test_single_proxy_unknown_id() {
    let env = maintenance_env();
    assert!(test_single_proxy(&env.storage, &env.config, 404).await.is_err());
}

#[tokio::test]
async fn test_all_proxies_deactivates_dead_ones() {
    let server = proxy_server().await;
    let env = maintenance_env();
    let (good, dead) = {
        let mut storage = lock_storage(&env.storage);
        (
            storage.add_proxy(USER, &server.uri(), "http").unwrap(),
            storage.add_proxy(USER, "http://127.0.0.1:1", "http").unwrap(),
        )
    };

    let reports = test_all_proxies(&env.storage, &env.config, USER)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].proxy_id, good);
    assert!(reports[0].is_active);
    assert_eq!(reports[1].proxy_id, dead);
    assert!(!reports[1].is_active);

    let storage = lock_storage(&env.storage);
    let active: Vec<i64> = storage
        .get_active_proxies(USER)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(active, vec![good]);
    assert!(storage.get_proxy(dead).unwrap().last_tested.is_some());
}
