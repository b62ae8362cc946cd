// Response Cache Middleware - serves cached GETs and invalidates before writes

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::infrastructure::cache_layer::{CachedResponse, ResponseCache};

pub const CACHE_STATUS_HEADER: &str = "x-cache";

pub async fn response_cache_middleware(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if !cache.is_enabled() {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    // 1. Reads: serve from cache or populate it
    if method == Method::GET {
        let key = ResponseCache::read_key(&uri);
        let Some(slot) = cache.slot(&path, &key).await else {
            return next.run(request).await;
        };

        if let Some(cached) = cache.lookup(&slot).await {
            return cached_response(cached);
        }

        let response = next.run(request).await;
        return store_if_cacheable(&cache, &slot, response).await;
    }

    if method == Method::HEAD || method == Method::OPTIONS {
        return next.run(request).await;
    }

    // 2. Writes: invalidate first, even if the handler later fails, and again
    // once it is done so reads that overlapped the write are dropped too
    cache.invalidate_for_write(&uri).await;
    let response = next.run(request).await;
    cache.invalidate_for_write(&uri).await;
    response
}

fn cached_response(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                HeaderName::from_static(CACHE_STATUS_HEADER),
                HeaderValue::from_static("HIT"),
            ),
        ],
        cached.body,
    )
        .into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Only successful JSON responses are stored.
async fn store_if_cacheable(cache: &ResponseCache, slot: &str, response: Response) -> Response {
    if !response.status().is_success() || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to buffer response body for caching: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        body: bytes.to_vec(),
    };
    cache.store(slot, &cached).await;

    parts.headers.insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static("MISS"),
    );
    Response::from_parts(parts, Body::from(bytes))
}
