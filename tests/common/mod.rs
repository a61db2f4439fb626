//! Shared harness for API tests: the full router over an in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use library_server::auth::hash_password;
use library_server::config::{Config, Environment, StorageBackend, DEFAULT_JWT_SECRET};
use library_server::middleware::SecurityHeaders;
use library_server::models::{NewUser, UserRole};
use library_server::routes::build_router;
use library_server::state::AppState;
use library_server::store::{LibraryStore, MemoryStore};

pub const PASSWORD: &str = "correct-horse";

pub fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        storage_backend: StorageBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        port: 0,
        jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        jwt_access_token_ttl_seconds: 300,
        jwt_refresh_token_ttl_days: 1,
        password_hash_cost: 4,
        page_size: 10,
        rate_limit_rps: 100,
        cors_allowed_origins: None,
        log_level: "warn".to_string(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn LibraryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_size(10)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        let mut config = test_config();
        config.page_size = page_size;

        let store: Arc<dyn LibraryStore> = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), &config);
        let router = build_router(state, SecurityHeaders::for_production(false));
        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Insert a user straight into the store, bypassing registration rules
    pub async fn seed_user(&self, username: &str, role: UserRole) -> String {
        let password_hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash,
                role,
            })
            .await
            .unwrap();
        user.id.to_string()
    }

    pub async fn login(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/token",
                None,
                json!({ "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["access"].as_str().unwrap().to_string()
    }

    /// Seed a user and return `(id, access token)`
    pub async fn user_with_token(&self, username: &str, role: UserRole) -> (String, String) {
        let id = self.seed_user(username, role).await;
        let token = self.login(username).await;
        (id, token)
    }

    pub async fn create_book(&self, admin_token: &str, title: &str, isbn: &str) -> String {
        let response = self
            .post(
                "/api/books",
                Some(admin_token),
                json!({
                    "title": title,
                    "author": "Test Author",
                    "isbn": isbn,
                    "page_count": 100
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}

/// A date `days` from today in UTC, as the API expects it
pub fn days_from_today(days: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
