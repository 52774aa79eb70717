//! Response-cache wrapper for expensive handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use valet_cache::ResponseCache;
use valet_http::{Request, Response};

use crate::Handler;

/// The shared-secret credential never participates in cache keys; a
/// rotated passcode must not fragment the cache or leak into stored keys.
const CREDENTIAL_PARAM: &str = "passcode";

/// Wraps `inner` with a cache lookup keyed by `(endpoint, query params)`.
///
/// On a hit the downstream collaborator is bypassed entirely. On a miss
/// the inner handler runs and its successful JSON body is stored under the
/// endpoint's TTL. TTLs are fixed per endpoint, a freshness choice made at
/// wiring time.
pub fn cached(
    cache: Arc<ResponseCache>,
    endpoint: &'static str,
    ttl: Duration,
    inner: Handler,
) -> Handler {
    Arc::new(move |req: Request| {
        let cache = cache.clone();
        let inner = inner.clone();
        Box::pin(async move {
            let params = cache_params(&req.query);
            if let Some(hit) = cache.get(endpoint, &params) {
                debug!(target: "valet::cache", endpoint, "Serving cached response");
                return Ok(Response::raw_json(200, hit));
            }

            let resp = inner(req).await?;
            if resp.status == 200 {
                if let Some(body) = resp.body_utf8() {
                    cache.put(endpoint, &params, body.to_string(), ttl);
                }
            }
            Ok(resp)
        })
    })
}

/// Query parameters minus the credential.
pub fn cache_params(query: &HashMap<String, String>) -> HashMap<String, String> {
    query
        .iter()
        .filter(|(name, _)| name.as_str() != CREDENTIAL_PARAM)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use valet_cache::ResponseCache;
    use valet_http::{parse_head, Response};

    use super::{cache_params, cached};
    use crate::handler;

    fn get(target: &str) -> valet_http::Request {
        let raw = format!("GET {target} HTTP/1.1\r\n\r\n");
        parse_head(raw.as_bytes())
            .expect("head")
            .into_request(Vec::new())
    }

    #[tokio::test]
    async fn second_identical_call_skips_the_inner_handler() {
        let cache = Arc::new(ResponseCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let wrapped = cached(
            cache,
            "/api/briefing",
            Duration::from_secs(60),
            handler(move |_req| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::json(200, &json!({"briefing": "busy day"})))
                }
            }),
        );

        let first = wrapped(get("/api/briefing?day=today")).await.expect("first");
        let second = wrapped(get("/api/briefing?day=today")).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.body_utf8(), second.body_utf8());
    }

    #[tokio::test]
    async fn different_params_miss_and_recompute() {
        let cache = Arc::new(ResponseCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let wrapped = cached(
            cache,
            "/api/calendar",
            Duration::from_secs(60),
            handler(move |_req| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::json(200, &json!({"events": []})))
                }
            }),
        );

        wrapped(get("/api/calendar?day=today")).await.expect("first");
        wrapped(get("/api/calendar?day=tomorrow")).await.expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = Arc::new(ResponseCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let wrapped = cached(
            cache,
            "/api/summaries",
            Duration::from_secs(60),
            handler(move |_req| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("backend down")
                }
            }),
        );

        assert!(wrapped(get("/api/summaries")).await.is_err());
        assert!(wrapped(get("/api/summaries")).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn credential_is_excluded_from_cache_params() {
        let req = get("/api/briefing?passcode=secret&day=today");
        let params = cache_params(&req.query);
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("day"));
    }
}
