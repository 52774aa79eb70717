//! Route table wiring.
//!
//! Builds the exact-match dispatch table: admin endpoints owned by the
//! core, everything else delegated to the [`Assistant`] collaborator.
//! Expensive read endpoints sit behind the response cache with fixed
//! per-endpoint TTLs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;
use valet_cache::ResponseCache;
use valet_core::auth::Passcode;
use valet_http::{Request, Response};
use valet_router::cached::{cache_params, cached};
use valet_router::{handler, Handler, Router};

use crate::assistant::{Assistant, AssistantFuture};

const BRIEFING_TTL: Duration = Duration::from_secs(1800);
const CALENDAR_TTL: Duration = Duration::from_secs(1800);
const SUMMARIES_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_RECENT_LIMIT: usize = 20;

pub fn build_router(
    assistant: Arc<dyn Assistant>,
    cache: Arc<ResponseCache>,
    passcode: Arc<Passcode>,
) -> Router {
    let mut router = Router::new();

    for path in ["/", "/index.html", "/web/index.html"] {
        router.public_path(path);
    }

    // ---- core-owned ----

    router.route(
        "GET",
        "/api/health",
        handler(|_req| async {
            Ok(Response::json(
                200,
                &json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }),
            ))
        }),
    );

    let cell = passcode.clone();
    router.route(
        "POST",
        "/api/config/passcode",
        handler(move |req| {
            let cell = cell.clone();
            async move {
                let body = match parse_json_body(&req) {
                    Ok(body) => body,
                    Err(resp) => return Ok(resp),
                };
                let Some(next) = body
                    .get("passcode")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                else {
                    return Ok(Response::error(400, "missing passcode field"));
                };
                cell.rotate(next);
                // Persisting the new value to external configuration is the
                // config collaborator's job; in memory it is live now.
                info!(target: "valet::admin", "Passcode rotated");
                Ok(Response::json(200, &json!({ "status": "updated" })))
            }
        }),
    );

    let store = cache.clone();
    router.route(
        "POST",
        "/api/cache/clear",
        handler(move |_req| {
            let store = store.clone();
            async move {
                store.delete_all();
                info!(target: "valet::admin", "Response cache cleared");
                Ok(Response::json(200, &json!({ "status": "cleared" })))
            }
        }),
    );

    let store = cache.clone();
    router.route(
        "GET",
        "/api/recent-activity",
        handler(move |req| {
            let store = store.clone();
            async move {
                let limit = req
                    .query_param("limit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RECENT_LIMIT);
                let entries: Vec<Value> = store
                    .recent_keys(limit)
                    .into_iter()
                    .map(|(endpoint, params, created_at)| {
                        json!({
                            "endpoint": endpoint,
                            "params": params,
                            "cached_at": DateTime::<Utc>::from(created_at).to_rfc3339(),
                        })
                    })
                    .collect();
                Ok(Response::json(200, &json!({ "entries": entries })))
            }
        }),
    );

    let store = cache.clone();
    router.route(
        "DELETE",
        "/api/recent-activity/delete",
        handler(move |req| {
            let store = store.clone();
            async move {
                let Some(endpoint) = req.query_param("endpoint").map(str::to_string) else {
                    return Ok(Response::error(400, "missing endpoint parameter"));
                };
                let mut params = cache_params(&req.query);
                params.remove("endpoint");
                let deleted = store.delete_one(&endpoint, &params);
                Ok(Response::json(200, &json!({ "deleted": deleted })))
            }
        }),
    );

    // ---- delegated, cached ----

    router.route(
        "GET",
        "/api/briefing",
        cached(
            cache.clone(),
            "/api/briefing",
            BRIEFING_TTL,
            delegate(assistant.clone(), |a, req| {
                a.daily_briefing(cache_params(&req.query))
            }),
        ),
    );
    router.route(
        "GET",
        "/api/calendar",
        cached(
            cache.clone(),
            "/api/calendar",
            CALENDAR_TTL,
            delegate(assistant.clone(), |a, req| {
                a.calendar(cache_params(&req.query))
            }),
        ),
    );
    router.route(
        "GET",
        "/api/summaries",
        cached(
            cache.clone(),
            "/api/summaries",
            SUMMARIES_TTL,
            delegate(assistant.clone(), |a, req| {
                a.message_summaries(cache_params(&req.query))
            }),
        ),
    );

    // ---- delegated, uncached ----

    router.route(
        "GET",
        "/api/commitments",
        delegate(assistant.clone(), |a, req| {
            a.commitments(cache_params(&req.query))
        }),
    );
    router.route(
        "GET",
        "/api/commitments/overdue",
        delegate(assistant.clone(), |a, _req| a.overdue_commitments()),
    );
    router.route(
        "POST",
        "/api/commitments/scan",
        delegate(assistant.clone(), |a, _req| a.scan_commitments()),
    );
    router.route(
        "GET",
        "/api/attention",
        delegate(assistant.clone(), |a, _req| a.attention_check()),
    );
    router.route(
        "POST",
        "/api/todos/scan",
        delegate(assistant.clone(), |a, _req| a.scan_todos()),
    );
    router.route(
        "GET",
        "/api/drafts",
        delegate(assistant.clone(), |a, _req| a.drafts()),
    );
    router.route(
        "GET",
        "/api/config/notion",
        delegate(assistant.clone(), |a, _req| a.notion_config()),
    );
    router.route(
        "POST",
        "/api/config/notion",
        delegate_with_body(assistant.clone(), |a, body| a.update_notion_config(body)),
    );
    router.route(
        "POST",
        "/api/query",
        delegate_with_body(assistant.clone(), |a, body| a.query(body)),
    );

    // ---- agent family ----

    router.route(
        "GET",
        "/api/agent/status",
        delegate(assistant.clone(), |a, _req| a.agent_status()),
    );
    router.route(
        "GET",
        "/api/agent/memory",
        delegate(assistant.clone(), |a, _req| a.agent_memories()),
    );
    router.route(
        "POST",
        "/api/agent/memory",
        delegate_with_body(assistant.clone(), |a, body| a.store_memory(body)),
    );
    router.route(
        "GET",
        "/api/agent/skills",
        delegate(assistant.clone(), |a, _req| a.agent_skills()),
    );
    router.route(
        "POST",
        "/api/agent/skills",
        delegate_with_body(assistant.clone(), |a, body| a.add_skill(body)),
    );
    router.route(
        "POST",
        "/api/agent/teach",
        delegate_with_body(assistant.clone(), |a, body| a.teach(body)),
    );
    router.route(
        "POST",
        "/api/agent/forget",
        delegate_with_body(assistant.clone(), |a, body| a.forget(body)),
    );
    router.route(
        "POST",
        "/api/agent/consolidate",
        delegate(assistant.clone(), |a, _req| a.consolidate()),
    );

    router
}

/// Delegates a request to one collaborator operation and serializes its
/// JSON result as a 200.
fn delegate<F>(assistant: Arc<dyn Assistant>, call: F) -> Handler
where
    F: Fn(&dyn Assistant, Request) -> AssistantFuture + Send + Sync + 'static,
{
    let call = Arc::new(call);
    handler(move |req| {
        let assistant = assistant.clone();
        let call = call.clone();
        async move {
            let value = call(assistant.as_ref(), req).await?;
            Ok(Response::json(200, &value))
        }
    })
}

/// Same, for operations that require a JSON request body. A missing or
/// unparseable body is a 400, never a 500.
fn delegate_with_body<F>(assistant: Arc<dyn Assistant>, call: F) -> Handler
where
    F: Fn(&dyn Assistant, Value) -> AssistantFuture + Send + Sync + 'static,
{
    let call = Arc::new(call);
    handler(move |req| {
        let assistant = assistant.clone();
        let call = call.clone();
        async move {
            let body = match parse_json_body(&req) {
                Ok(body) => body,
                Err(resp) => return Ok(resp),
            };
            let value = call(assistant.as_ref(), body).await?;
            Ok(Response::json(200, &value))
        }
    })
}

fn parse_json_body(req: &Request) -> Result<Value, Response> {
    let Some(body) = req.body.as_deref() else {
        return Err(Response::error(400, "request body required"));
    };
    serde_json::from_slice(body)
        .map_err(|_| Response::error(400, "request body is not valid JSON"))
}
