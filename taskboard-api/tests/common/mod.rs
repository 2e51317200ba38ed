//! Common test utilities for HTTP tests
//!
//! Builds the full router over an in-memory store and offers a small JSON
//! request helper. Users are inserted straight into the store and given a
//! freshly issued token, so only the auth tests pay for password hashing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::models::user::CreateUser;
use taskboard_shared::store::memory::MemoryStore;
use taskboard_shared::store::UserStore;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A registered user and a valid bearer token for them
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgresql://localhost/unused"),
        ("JWT_SECRET", TEST_SECRET),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config());
        let app = build_router(state.clone());

        Self { app, state, store }
    }

    /// Inserts a user directly and issues a token for them
    pub async fn user(&self, name: &str) -> TestUser {
        let user = self
            .store
            .insert_user(&CreateUser {
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                name: name.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .expect("insert user");
        let token = self.state.tokens.issue(user.id).expect("issue token");

        TestUser {
            id: user.id,
            email: user.email,
            token,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` when the body is empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Creates a board and returns its ID
    pub async fn board(&self, owner: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post("/boards", owner, serde_json::json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        id_of(&body)
    }

    /// Creates a column at the end of a board and returns its ID
    pub async fn column(&self, owner: &TestUser, board_id: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                "/columns",
                owner,
                serde_json::json!({ "board_id": board_id, "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        id_of(&body)
    }

    /// Creates a task at the end of a column and returns its ID
    pub async fn task(&self, owner: &TestUser, column_id: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                "/tasks",
                owner,
                serde_json::json!({ "column_id": column_id, "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        id_of(&body)
    }

    pub async fn share(&self, owner: &TestUser, board_id: &str, with: &TestUser, role: &str) {
        let (status, body) = self
            .post(
                &format!("/boards/{}/share", board_id),
                owner,
                serde_json::json!({ "email": with.email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }
}

pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("body has an id").to_string()
}

/// Titles of a JSON array of columns or tasks, in order
pub fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|item| item["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
