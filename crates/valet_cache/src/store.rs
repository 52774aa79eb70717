use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use crate::entry::CacheEntry;
use crate::key::{derive_key, params_json};

/// Concurrent TTL cache keyed by `(endpoint, sorted params)`.
///
/// Safe from any number of in-flight connections; the sharded map
/// serializes writers per entry, and readers never observe a half-written
/// entry. Expired entries are removed lazily on lookup; there is no
/// background sweep.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the cached response, or `None` on miss or expiry.
    pub fn get(&self, endpoint: &str, params: &HashMap<String, String>) -> Option<String> {
        let key = derive_key(endpoint, params);
        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(SystemTime::now()) {
                return Some(entry.response.clone());
            }
            drop(entry);
            self.entries.remove(&key);
        }
        None
    }

    /// Upserts; an existing entry under the same key is replaced, never
    /// duplicated.
    pub fn put(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        response: String,
        ttl: Duration,
    ) {
        let now = SystemTime::now();
        let entry = CacheEntry {
            endpoint: endpoint.to_string(),
            params_json: params_json(params),
            response,
            created_at: now,
            expires_at: now + ttl,
        };
        self.entries.insert(derive_key(endpoint, params), entry);
    }

    /// Removes one entry by its derived key; reports whether it existed.
    pub fn delete_one(&self, endpoint: &str, params: &HashMap<String, String>) -> bool {
        self.entries.remove(&derive_key(endpoint, params)).is_some()
    }

    pub fn delete_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently created `(endpoint, params_json, created_at)` rows,
    /// newest first. Ties break by key text so enumeration is stable.
    /// A derived read for the recent-activity view, not part of the
    /// cache's correctness contract.
    pub fn recent_keys(&self, limit: usize) -> Vec<(String, String, SystemTime)> {
        let mut rows: Vec<(String, String, SystemTime)> = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.value().endpoint.clone(),
                    e.value().params_json.clone(),
                    e.value().created_at,
                )
            })
            .collect();
        rows.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        rows.truncate(limit);
        rows
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::ResponseCache;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn get_hits_regardless_of_param_order() {
        let cache = ResponseCache::new();
        cache.put(
            "/api/briefing",
            &params(&[("b", "2"), ("a", "1")]),
            "{\"x\":1}".to_string(),
            TTL,
        );
        let hit = cache.get("/api/briefing", &params(&[("a", "1"), ("b", "2")]));
        assert_eq!(hit.as_deref(), Some("{\"x\":1}"));
    }

    #[test]
    fn put_replaces_an_existing_entry() {
        let cache = ResponseCache::new();
        let p = params(&[("a", "1")]);
        cache.put("/api/briefing", &p, "old".to_string(), TTL);
        cache.put("/api/briefing", &p, "new".to_string(), TTL);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/api/briefing", &p).as_deref(), Some("new"));
    }

    #[test]
    fn expired_entries_miss_and_are_purged() {
        let cache = ResponseCache::new();
        let p = params(&[("a", "1")]);
        cache.put("/api/briefing", &p, "stale".to_string(), Duration::from_millis(10));
        assert!(cache.get("/api/briefing", &p).is_some());
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("/api/briefing", &p).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn delete_one_reports_existence() {
        let cache = ResponseCache::new();
        let p = params(&[("a", "1")]);
        cache.put("/api/calendar", &p, "{}".to_string(), TTL);
        assert!(cache.delete_one("/api/calendar", &p));
        assert!(!cache.delete_one("/api/calendar", &p));
    }

    #[test]
    fn delete_all_empties_the_store() {
        let cache = ResponseCache::new();
        cache.put("/api/calendar", &params(&[("a", "1")]), "{}".to_string(), TTL);
        cache.put("/api/summaries", &params(&[]), "{}".to_string(), TTL);
        cache.delete_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn recent_keys_orders_newest_first_and_respects_limit() {
        let cache = ResponseCache::new();
        cache.put("/api/calendar", &params(&[]), "{}".to_string(), TTL);
        std::thread::sleep(Duration::from_millis(5));
        cache.put("/api/summaries", &params(&[]), "{}".to_string(), TTL);
        std::thread::sleep(Duration::from_millis(5));
        cache.put("/api/briefing", &params(&[("day", "today")]), "{}".to_string(), TTL);

        let recent = cache.recent_keys(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0, "/api/briefing");
        assert_eq!(recent[0].1, "{\"day\":\"today\"}");
        assert_eq!(recent[1].0, "/api/summaries");
    }

    #[test]
    fn reinserting_a_key_keeps_enumeration_distinct() {
        let cache = ResponseCache::new();
        let p = params(&[("a", "1")]);
        cache.put("/api/briefing", &p, "one".to_string(), TTL);
        std::thread::sleep(Duration::from_millis(5));
        cache.put("/api/briefing", &p, "two".to_string(), TTL);
        assert_eq!(cache.recent_keys(10).len(), 1);
    }
}
