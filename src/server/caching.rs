//! Shared response-cache plumbing for the read API (spec §4.8 "Response
//! cache"): canonical keying is the caller's job (see [`crate::cache`]), this
//! module turns a cache hit/miss into an HTTP response with `Cache-Control`,
//! `ETag`, and `If-None-Match`/304 handling.

use crate::cache::{CacheEntry, ResponseCache};
use crate::errors::ApiError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Serves `key` from `cache` if fresh or matched by `if_none_match`; otherwise
/// runs `compute`, serialises the result, and stores it with `max_age` /
/// `stale_while_revalidate` before serving it.
pub async fn cached_json<T, F, Fut>(
    cache: &ResponseCache, key: String, max_age: Duration, stale_while_revalidate: Duration,
    if_none_match: Option<String>, compute: F,
) -> Result<Response, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Some(entry) = cache.get(&key) {
        if etag_matches(if_none_match.as_deref(), &entry.etag) {
            return Ok(not_modified(&entry));
        }
        if entry.is_fresh() {
            return Ok(entry_response(StatusCode::OK, &entry));
        }
    }

    let value = compute().await?;
    let body = serde_json::to_vec(&value).map_err(anyhow::Error::from)?;
    let entry = CacheEntry::new(body, max_age, stale_while_revalidate);
    cache.put(key, entry.clone());
    Ok(entry_response(StatusCode::OK, &entry))
}

fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|inm| inm.trim() == etag || inm.trim().trim_matches('"') == etag.trim_matches('"'))
}

fn entry_response(status: StatusCode, entry: &CacheEntry) -> Response {
    let mut response = (status, entry.body.clone()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_str(&entry.cache_control()).unwrap());
    headers.insert(header::ETAG, HeaderValue::from_str(&entry.etag).unwrap());
    response
}

fn not_modified(entry: &CacheEntry) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_str(&entry.cache_control()).unwrap());
    headers.insert(header::ETAG, HeaderValue::from_str(&entry.etag).unwrap());
    response
}
