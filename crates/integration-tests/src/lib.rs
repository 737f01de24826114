//! Integration tests for the Jamur POS server.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare a database with the demo accounts and catalog
//! jamur-pos migrate
//! jamur-pos seed demo
//!
//! # Start the server (FONNTE_TOKEN may be left unset)
//! cargo run -p jamur-pos-server
//!
//! # Run the ignored tests against it
//! cargo test -p jamur-pos-integration-tests -- --ignored
//! ```
//!
//! `POS_TEST_BASE_URL` points the tests at a server other than
//! `http://127.0.0.1:8000`.

use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};

/// Demo owner created by `jamur-pos seed demo`.
pub const OWNER_EMAIL: &str = "owner@jamur.com";

/// Demo cashier created by `jamur-pos seed demo`.
pub const CASHIER_EMAIL: &str = "kasir@jamur.com";

/// Password shared by the demo accounts.
pub const DEMO_PASSWORD: &str = "password";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("POS_TEST_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// Absolute URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client that keeps cookies, asks for JSON and never follows redirects.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Log in and return the client holding the session cookie.
///
/// # Panics
///
/// Panics if the login request fails or is rejected.
pub async fn login_as(email: &str) -> Client {
    let client = client();
    let resp = client
        .post(url("/login"))
        .json(&json!({"email": email, "password": DEMO_PASSWORD}))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");
    client
}

/// Parse a response body as JSON after checking its status.
///
/// # Panics
///
/// Panics on an unexpected status or a non-JSON body.
pub async fn json_body(resp: reqwest::Response, expected: StatusCode) -> Value {
    let status = resp.status();
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(status, expected, "unexpected status, body: {body}");
    serde_json::from_str(&body).expect("Response body is not JSON")
}

/// A name unlikely to collide with existing rows.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let id: String = uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{prefix} {id}")
}

/// Smallest byte string the server accepts as a PNG upload.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
