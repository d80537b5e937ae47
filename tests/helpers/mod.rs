//! Shared setup for tests that drive the client against a stubbed service

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use headshot_client::app_state::AppState;
use headshot_client::config::AppConfig;
use headshot_client::services::events::ClientEvent;
use headshot_client::services::poller::PollState;

pub const TEST_TOKEN: &str = "test-token";

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(3);

/// A client wired to its own mock service.
pub struct TestClient {
    pub server: MockServer,
    pub state: AppState,
    pub events: broadcast::Receiver<ClientEvent>,
}

/// Config with a fast poll cadence, pointed at `base_url`.
pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        api_base_url: base_url.to_string(),
        poll_interval_ms: 20,
        poll_max_consecutive_failures: 3,
        poll_backoff_multiplier: 2.0,
        poll_max_delay_ms: 100,
        poll_jitter: false,
        request_timeout_secs: 5,
        token: Some(TEST_TOKEN.to_string()),
        require_login: true,
    }
}

/// Logged-in client.
pub async fn start_client() -> TestClient {
    let server = MockServer::start().await;
    let config = test_config(&server.uri());
    build(server, config)
}

/// Client with no session credential.
pub async fn start_anonymous_client() -> TestClient {
    let server = MockServer::start().await;
    let config = AppConfig {
        token: None,
        ..test_config(&server.uri())
    };
    build(server, config)
}

fn build(server: MockServer, config: AppConfig) -> TestClient {
    let state = AppState::new(&config).expect("Failed to build client");
    let events = state.subscribe();
    TestClient {
        server,
        state,
        events,
    }
}

/// Empty dashboard listings so refreshes succeed quietly.
pub async fn mount_empty_dashboard(server: &MockServer) {
    mount_json(server, "GET", "/api/orders", json!({ "orders": [] })).await;
    mount_json(server, "GET", "/api/jobs", json!({ "jobs": [] })).await;
    mount_json(
        server,
        "GET",
        "/api/metrics",
        json!({
            "orders": 0,
            "jobs": 0,
            "completedJobs": 0,
            "supportTickets": 0,
            "estimatedConversionRate": 0.0
        }),
    )
    .await;
}

pub async fn mount_json(server: &MockServer, http_method: &str, url_path: &str, body: serde_json::Value) {
    Mock::given(method(http_method))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Respond `status` with `{"error": message}`.
pub async fn mount_error(server: &MockServer, http_method: &str, url_path: &str, status: u16, message: &str) {
    Mock::given(method(http_method))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
        .mount(server)
        .await;
}

/// Number of recorded requests for `http_method` on `url_path`.
pub async fn request_count(server: &MockServer, http_method: &str, url_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string() == http_method && r.url.path() == url_path)
        .count()
}

/// Wait for the first event matching `predicate`, skipping the rest.
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<ClientEvent>, mut predicate: F) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for event")
}

/// Everything published so far, without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait for the poller to leave `Polling`.
pub async fn wait_settled(state: &AppState) -> PollState {
    tokio::time::timeout(WAIT, state.poller.wait_until_settled())
        .await
        .expect("Timed out waiting for polling to settle")
}
