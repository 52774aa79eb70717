use std::sync::Arc;

use valet_cache::ResponseCache;
use valet_config::ValetConfig;
use valet_router::Router;

use crate::auth::Passcode;

/// State shared by every in-flight connection.
///
/// The route table is immutable after startup; the passcode and the cache
/// are the only mutable members, each behind its own synchronization.
pub struct AppState {
    pub cfg: ValetConfig,
    pub router: Router,
    pub cache: Arc<ResponseCache>,
    pub passcode: Arc<Passcode>,
}
