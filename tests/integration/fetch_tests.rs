use crate::common::{html, TestEnv};
use contact_scout::fetch::FetchRequest;
use contact_scout::{FetchMethod, FetchResult};
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(url: String) -> FetchRequest {
    FetchRequest::new(url, Duration::from_secs(5))
}

#[tokio::test]
async fn test_direct_fetch_success_sends_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(html("<p>hello@acme-corp.com</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let result = env.direct().fetch(&request(server.uri())).await;

    match result {
        FetchResult::Success {
            status_code,
            body,
            method,
            ..
        } => {
            assert_eq!(status_code, 200);
            assert!(body.contains("hello@acme-corp.com"));
            assert_eq!(method, FetchMethod::Direct);
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_direct_fetch_follows_redirects() {
    let server = MockServer::start().await;
    let new_url = format!("{}/new", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", new_url.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<p>moved</p>"))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let result = env
        .direct()
        .fetch(&request(format!("{}/old", server.uri())))
        .await;

    match result {
        FetchResult::Success { final_url, .. } => {
            assert_eq!(final_url, new_url);
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_direct_fetch_classifies_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let direct = env.direct();

    let blocked = direct
        .fetch(&request(format!("{}/blocked", server.uri())))
        .await;
    assert!(blocked.needs_escalation());
    assert!(!blocked.is_retryable());

    let broken = direct
        .fetch(&request(format!("{}/broken", server.uri())))
        .await;
    assert_eq!(broken.status_code(), Some(500));
    assert!(broken.is_retryable());
}

#[tokio::test]
async fn test_direct_fetch_connection_refused() {
    let env = TestEnv::new();
    let result = env
        .direct()
        .fetch(&request("http://127.0.0.1:1/".to_string()))
        .await;

    assert!(matches!(
        result,
        FetchResult::NetworkError {
            timeout: false,
            method: FetchMethod::Direct,
            ..
        }
    ));
}

#[tokio::test]
async fn test_direct_fetch_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let result = env
        .direct()
        .fetch(&FetchRequest::new(server.uri(), Duration::from_millis(200)))
        .await;

    assert!(matches!(
        result,
        FetchResult::NetworkError { timeout: true, .. }
    ));
}
