// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chrono::{Duration, Utc};
use oh_fitbit::config::Config;
use oh_fitbit::db::Database;
use oh_fitbit::models::OpenHumansMember;
use oh_fitbit::services::{OpenHumansClient, OpenHumansService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// A request received by the mock token endpoint.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub form: HashMap<String, String>,
}

#[derive(Clone)]
#[allow(dead_code)]
struct MockState {
    status: StatusCode,
    body: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for the Open Humans token endpoint.
#[allow(dead_code)]
pub struct MockTokenEndpoint {
    pub url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl MockTokenEndpoint {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[allow(dead_code)]
async fn token_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(RecordedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        form,
    });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Serve `body` with `status` for every POST to `/oauth2/token/`.
#[allow(dead_code)]
pub async fn spawn_token_endpoint(status: StatusCode, body: &str) -> MockTokenEndpoint {
    let calls = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body: body.to_string(),
        calls: calls.clone(),
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/oauth2/token/", post(token_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockTokenEndpoint {
        url: format!("http://{}/oauth2/token/", addr),
        calls,
        requests,
    }
}

/// Config pointing the token client at `token_url`.
#[allow(dead_code)]
pub fn test_config(token_url: &str) -> Config {
    Config {
        oh_token_url: token_url.to_string(),
        http_timeout_secs: 5,
        ..Config::default()
    }
}

/// In-memory database plus a service talking to `token_url`.
#[allow(dead_code)]
pub fn test_service(token_url: &str) -> (OpenHumansService, Database) {
    let config = test_config(token_url);
    let db = Database::in_memory();
    let client = OpenHumansClient::new(&config).expect("client should build");
    (OpenHumansService::new(client, db.clone()), db)
}

/// A member whose token expires `expires_in_secs` from now (negative: already expired).
#[allow(dead_code)]
pub fn test_member(oh_id: &str, expires_in_secs: i64) -> OpenHumansMember {
    OpenHumansMember {
        oh_id: oh_id.to_string(),
        user: format!("{}_openhumans", oh_id),
        access_token: "A1".to_string(),
        refresh_token: "R1".to_string(),
        token_expires: Utc::now() + Duration::seconds(expires_in_secs),
    }
}
