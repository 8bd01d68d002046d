//! The read API's short-TTL, process-local response cache (spec §2 item 10,
//! §4.8, §8 scenario 3). Entries are keyed by a canonicalised route+params
//! string, carry a serialised body and an ETag, and are served with
//! `Cache-Control: public, max-age=<ttl>, stale-while-revalidate=<stale>`.
//! Racing writers last-writer-wins (spec §5) — there is no single-flight.

use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Vec<u8>,
    pub etag: String,
    pub max_age: Duration,
    pub stale_while_revalidate: Duration,
    inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(body: Vec<u8>, max_age: Duration, stale_while_revalidate: Duration) -> Self {
        let etag = format!("\"{}\"", hex_hash(&body));
        Self { body, etag, max_age, stale_while_revalidate, inserted_at: Instant::now() }
    }

    pub fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() <= self.max_age
    }

    pub fn is_within_stale_window(&self) -> bool {
        self.inserted_at.elapsed() <= self.max_age + self.stale_while_revalidate
    }

    pub fn cache_control(&self) -> String {
        format!(
            "public, max-age={}, stale-while-revalidate={}",
            self.max_age.as_secs(),
            self.stale_while_revalidate.as_secs()
        )
    }
}

/// Thread-safe key/value response cache. Not persisted; lost on restart by design.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry if present and still inside its fresh-or-stale window.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.is_within_stale_window() {
            Some(entry.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }
}

fn hex_hash(body: &[u8]) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    body.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Round a coordinate to the 4-decimal precision the cache keys on (spec §4.8, §9).
pub fn round_coord(value: f64) -> String {
    format!("{value:.4}")
}

/// Round a bbox value to the 3-decimal precision the cache keys on (spec §4.8).
pub fn round_bbox(value: f64) -> String {
    format!("{value:.3}")
}

/// Builds a canonical cache key from a route name and a set of already-rounded
/// `key=value` parameter strings, sorted for stability regardless of call order.
pub fn canonical_key(route: &str, mut params: Vec<String>) -> String {
    params.sort();
    format!("{route}?{}", params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_etag_is_hex_hash_of_body() {
        let entry = CacheEntry::new(b"hello".to_vec(), Duration::from_secs(15), Duration::from_secs(30));
        assert!(entry.etag.starts_with('"') && entry.etag.ends_with('"'));
        assert_eq!(entry.etag.trim_matches('"').len(), 16);
    }

    #[test]
    fn test_cache_hit_returns_byte_identical_body_and_etag() {
        let cache = ResponseCache::new();
        let entry = CacheEntry::new(b"payload".to_vec(), Duration::from_secs(15), Duration::from_secs(30));
        cache.put("k".into(), entry.clone());

        let first = cache.get("k").unwrap();
        let second = cache.get("k").unwrap();
        assert_eq!(first.body, second.body);
        assert_eq!(first.etag, second.etag);
    }

    #[test]
    fn test_cache_miss_outside_stale_window() {
        let cache = ResponseCache::new();
        let entry = CacheEntry::new(b"payload".to_vec(), Duration::from_millis(1), Duration::from_millis(1));
        cache.put("k".into(), entry);
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_canonical_key_is_order_independent() {
        let a = canonical_key("forecast", vec!["b=2".into(), "a=1".into()]);
        let b = canonical_key("forecast", vec!["a=1".into(), "b=2".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_coord_and_bbox_precision() {
        assert_eq!(round_coord(34.0512345), "34.0512");
        assert_eq!(round_bbox(34.0512345), "34.051");
    }
}
