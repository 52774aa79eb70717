//! Request routing.
//!
//! Maps `(method, path)` exactly to a handler; no pattern matching, no path
//! parameters. Owns the set of public (unauthenticated) paths. Handler
//! failures are caught at the dispatch boundary and translated to a 500
//! response, so a connection is never left unanswered by a downstream
//! failure.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, warn};
use valet_http::{Request, Response};

pub mod cached;

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Response>> + Send>>;

/// An opaque async handler: the external collaborator seam.
pub type Handler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// Wraps a plain async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Immutable once the table is built at startup.
#[derive(Default)]
pub struct Router {
    routes: HashMap<(String, String), Handler>,
    public_paths: HashSet<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, method: &str, path: &str, handler: Handler) {
        self.routes
            .insert((method.to_string(), path.to_string()), handler);
    }

    /// Marks a path as exempt from authentication.
    pub fn public_path(&mut self, path: &str) {
        self.public_paths.insert(path.to_string());
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Looks up and invokes the matching handler.
    ///
    /// Unmatched combinations return 404. A handler error becomes a 500
    /// carrying the message under `error`, echoed under `response` for
    /// display in the UI.
    pub async fn dispatch(&self, req: Request) -> Response {
        let key = (req.method.clone(), req.path.clone());
        let Some(route) = self.routes.get(&key) else {
            warn!(
                target: "valet::router",
                method = %req.method,
                path = %req.path,
                "No route matched"
            );
            return Response::error(404, &format!("no route for {} {}", req.method, req.path));
        };

        match route(req).await {
            Ok(resp) => resp,
            Err(err) => {
                error!(
                    target: "valet::router",
                    method = %key.0,
                    path = %key.1,
                    error = %err,
                    "Handler failed"
                );
                let message = err.to_string();
                Response::json(500, &json!({ "error": message, "response": message }))
            }
        }
    }
}
