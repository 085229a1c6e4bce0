#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Method, Request, StatusCode, header},
};
use backend::{
    AppState,
    auth::AuthKeys,
    dbs::{LocalStore, SqliteDatabase},
    openai::Generator,
};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::models::AppSettings;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Serves `router` on an ephemeral local port and returns its `/v1` base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

/// A base URL nothing is listening on.
pub async fn dead_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

pub fn settings(api_base: &str) -> AppSettings {
    AppSettings {
        api_key: "test-key".to_string(),
        api_base: api_base.to_string(),
        request_timeout_secs: 5,
        ..AppSettings::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new(api_base: &str) -> Self {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let state = AppState::assemble(
            Arc::new(db),
            LocalStore::in_memory(),
            Generator::new(settings(api_base)).unwrap(),
            AuthKeys::new("test-secret", 30),
        )
        .await
        .unwrap();
        let router = backend::with_state(Router::new(), state.clone());
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.request(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Registers a user and returns the session token.
    pub async fn sign_up(&self, email: &str, password: &str) -> String {
        let (status, session) = self
            .json(
                Method::POST,
                "/api/auth/sign-up",
                None,
                Some(serde_json::json!({
                    "name": "Айгерім",
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        session["access_token"].as_str().unwrap().to_string()
    }
}
