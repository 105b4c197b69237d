//! Shared helpers for the web API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use mailroom::auth::TokenIssuer;
use mailroom::web::middleware::RateLimitState;
use mailroom::web::{create_health_router, create_router, AppState};
use mailroom::{AttachmentStorage, Database};

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const PASSWORD: &str = "password123";

/// A running test server with its backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub storage_dir: TempDir,
}

/// Server options that vary between suites.
pub struct TestOptions {
    pub max_upload_size: u64,
    pub login_rate_limit: Option<u32>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_upload_size: 10 * 1024 * 1024,
            login_rate_limit: None,
        }
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(TestOptions::default()).await
}

pub async fn spawn_app_with(options: TestOptions) -> TestApp {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let storage_dir = TempDir::new().expect("Failed to create storage dir");
    let storage = AttachmentStorage::new(storage_dir.path()).expect("Failed to open storage");
    let tokens = Arc::new(TokenIssuer::new(JWT_SECRET, 900));

    let app_state = Arc::new(AppState::new(
        db.clone(),
        tokens,
        storage,
        options.max_upload_size,
    ));
    let rate_limit = options
        .login_rate_limit
        .map(|limit| Arc::new(RateLimitState::new(limit)));

    let router = create_router(app_state.clone(), &[], rate_limit)
        .merge(create_health_router(app_state));
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        storage_dir,
    }
}

/// Register a user and return the response body.
pub async fn register(server: &TestServer, email: &str, first: &str, last: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "firstName": first,
            "lastName": last
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Register a user and return `(token, user_id)`.
pub async fn register_user(server: &TestServer, email: &str, first: &str) -> (String, i64) {
    let body = register(server, email, first, "Tester").await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["userId"].as_i64().unwrap(),
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Send a message and return its JSON.
pub async fn send(server: &TestServer, token: &str, to: &str, subject: &str) -> Value {
    let response = server
        .post("/api/email/send")
        .add_header(axum::http::header::AUTHORIZATION, bearer(token))
        .json(&json!({
            "subject": subject,
            "body": format!("Body of {}", subject),
            "recipientEmail": to
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}
