//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router (including the error page middleware)
//! in-process. There is no storage: each request carries its state in `s`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cashkey::config::Config;
use cashkey::server::build_app;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub struct TestClient {
    app: Router,
}

impl TestClient {
    /// Client with default config (sample data enabled, 20 % VAT).
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Client that shows an empty state when the address has none.
    pub fn without_sample_data() -> Self {
        Self::with_config(Config {
            sample_data: false,
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        let (_state, app) = build_app(config);
        Self { app }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, location, String::from_utf8_lossy(&body).to_string())
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let (status, _, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, body)
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }

    /// POST a form; returns status and the redirect target, if any.
    pub async fn post_form(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
    ) -> (StatusCode, Option<String>) {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let (status, location, _) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        (status, location)
    }

    /// POST a JSON body and return status and parsed response.
    pub async fn post_json(
        &self,
        uri: &str,
        body: &serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        let parsed = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    // =========================================================================
    // Helpers for building states through the forms
    // =========================================================================

    /// Add a line via the HTML form and return the new fragment.
    pub async fn add_item(&self, side: &str, fragment: &str, name: &str, amount: &str) -> String {
        self.add_item_with(side, fragment, &[("name", name), ("amount", amount)])
            .await
    }

    pub async fn add_item_with(
        &self,
        side: &str,
        fragment: &str,
        fields: &[(&str, &str)],
    ) -> String {
        let mut form = vec![("s", fragment)];
        form.extend_from_slice(fields);
        let (status, location) = self.post_form(&format!("/{}", side), &form).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "adding to {} failed", side);
        fragment_from_location(&location.expect("redirect location"))
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the state fragment from a `/?s=...` redirect target.
pub fn fragment_from_location(location: &str) -> String {
    location
        .strip_prefix("/?s=")
        .unwrap_or_else(|| panic!("unexpected redirect target {}", location))
        .to_string()
}
