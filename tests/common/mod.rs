// Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use campus_forum::api::create_router;
use campus_forum::app_state::AppState;
use campus_forum::config::Config;
use campus_forum::infrastructure::cache_layer::{MemoryCacheBackend, ResponseCache};
use campus_forum::infrastructure::database::EntityStore;
use campus_forum::infrastructure::sqlite_database::SqliteEntityStore;

pub async fn state_with_store(store: Arc<dyn EntityStore>) -> AppState {
    let cache = ResponseCache::new(Arc::new(MemoryCacheBackend::new(100)), Duration::from_secs(60));
    AppState::from_parts(Config::in_memory(), store, cache)
}

pub async fn app() -> Router {
    let store = SqliteEntityStore::new_in_memory().await.unwrap();
    create_router(state_with_store(Arc::new(store)).await)
}

/// Identity headers for a request. `None` sends an anonymous request.
#[derive(Clone, Copy)]
pub struct As<'a> {
    pub user: Option<&'a str>,
    pub verified: bool,
    pub admin: bool,
}

pub const ANON: As<'static> = As {
    user: None,
    verified: false,
    admin: false,
};

pub fn user(id: &str) -> As<'_> {
    As {
        user: Some(id),
        verified: false,
        admin: false,
    }
}

pub fn member(id: &str) -> As<'_> {
    As {
        user: Some(id),
        verified: true,
        admin: false,
    }
}

pub fn admin(id: &str) -> As<'_> {
    As {
        user: Some(id),
        verified: true,
        admin: true,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cache: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

pub async fn send(app: &Router, method: &str, uri: &str, who: As<'_>, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = who.user {
        builder = builder.header("x-user-id", id).header("x-user-name", id);
    }
    if who.verified {
        builder = builder.header("x-verified-member", "true");
    }
    if who.admin {
        builder = builder.header("x-admin", "true");
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cache = response
        .headers()
        .get("x-cache")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    TestResponse { status, cache, bytes }
}
