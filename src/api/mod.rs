// HTTP API - route tables and handlers for every resource

use axum::{middleware, Router};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::infrastructure::middleware::{response_cache_middleware, viewer_context_middleware};

pub mod admin;
pub mod courses;
pub mod posts;
pub mod professors;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

/// Build the application router.
///
/// Requests pass CORS, tracing and the identity middleware before the response
/// cache, so cached reads are still traced.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(posts::routes())
        .merge(courses::routes())
        .merge(professors::routes())
        .merge(admin::routes());

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.cache.clone(),
            response_cache_middleware,
        ))
        .layer(middleware::from_fn(viewer_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
