//! The business-logic collaborator behind the HTTP core.
//!
//! Implementations talk to the AI / Notion / calendar backends; the server
//! only routes to them and serializes their results. Every operation is an
//! opaque async call producing a JSON value or an error.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Result future returned by every collaborator operation.
pub type AssistantFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

pub trait Assistant: Send + Sync {
    fn daily_briefing(&self, params: HashMap<String, String>) -> AssistantFuture;
    fn commitments(&self, params: HashMap<String, String>) -> AssistantFuture;
    fn overdue_commitments(&self) -> AssistantFuture;
    fn scan_commitments(&self) -> AssistantFuture;
    fn calendar(&self, params: HashMap<String, String>) -> AssistantFuture;
    fn message_summaries(&self, params: HashMap<String, String>) -> AssistantFuture;
    fn attention_check(&self) -> AssistantFuture;
    fn scan_todos(&self) -> AssistantFuture;
    fn drafts(&self) -> AssistantFuture;
    fn notion_config(&self) -> AssistantFuture;
    fn update_notion_config(&self, body: Value) -> AssistantFuture;
    fn query(&self, body: Value) -> AssistantFuture;
    fn agent_status(&self) -> AssistantFuture;
    fn agent_memories(&self) -> AssistantFuture;
    fn store_memory(&self, body: Value) -> AssistantFuture;
    fn agent_skills(&self) -> AssistantFuture;
    fn add_skill(&self, body: Value) -> AssistantFuture;
    fn teach(&self, body: Value) -> AssistantFuture;
    fn forget(&self, body: Value) -> AssistantFuture;
    fn consolidate(&self) -> AssistantFuture;
}

/// Stand-in used when no backend is wired up.
///
/// Every operation reports the backend as unavailable; the dispatcher
/// surfaces that as a 500 with the message in the body, so the web UI
/// still renders something actionable.
pub struct OfflineAssistant;

fn unavailable(operation: &'static str) -> AssistantFuture {
    Box::pin(async move {
        anyhow::bail!("assistant backend not running (operation: {operation})")
    })
}

impl Assistant for OfflineAssistant {
    fn daily_briefing(&self, _params: HashMap<String, String>) -> AssistantFuture {
        unavailable("daily_briefing")
    }

    fn commitments(&self, _params: HashMap<String, String>) -> AssistantFuture {
        unavailable("commitments")
    }

    fn overdue_commitments(&self) -> AssistantFuture {
        unavailable("overdue_commitments")
    }

    fn scan_commitments(&self) -> AssistantFuture {
        unavailable("scan_commitments")
    }

    fn calendar(&self, _params: HashMap<String, String>) -> AssistantFuture {
        unavailable("calendar")
    }

    fn message_summaries(&self, _params: HashMap<String, String>) -> AssistantFuture {
        unavailable("message_summaries")
    }

    fn attention_check(&self) -> AssistantFuture {
        unavailable("attention_check")
    }

    fn scan_todos(&self) -> AssistantFuture {
        unavailable("scan_todos")
    }

    fn drafts(&self) -> AssistantFuture {
        unavailable("drafts")
    }

    fn notion_config(&self) -> AssistantFuture {
        unavailable("notion_config")
    }

    fn update_notion_config(&self, _body: Value) -> AssistantFuture {
        unavailable("update_notion_config")
    }

    fn query(&self, _body: Value) -> AssistantFuture {
        unavailable("query")
    }

    fn agent_status(&self) -> AssistantFuture {
        unavailable("agent_status")
    }

    fn agent_memories(&self) -> AssistantFuture {
        unavailable("agent_memories")
    }

    fn store_memory(&self, _body: Value) -> AssistantFuture {
        unavailable("store_memory")
    }

    fn agent_skills(&self) -> AssistantFuture {
        unavailable("agent_skills")
    }

    fn add_skill(&self, _body: Value) -> AssistantFuture {
        unavailable("add_skill")
    }

    fn teach(&self, _body: Value) -> AssistantFuture {
        unavailable("teach")
    }

    fn forget(&self, _body: Value) -> AssistantFuture {
        unavailable("forget")
    }

    fn consolidate(&self) -> AssistantFuture {
        unavailable("consolidate")
    }
}
