use std::sync::Arc;

use tracing::info;
use utils::init_tracing;
use valet_cache::ResponseCache;
use valet_config::ValetConfig;
use valet_core::auth::Passcode;
use valet_core::server::Server;
use valet_core::state::AppState;

mod assistant;
mod routes;

use assistant::OfflineAssistant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = ValetConfig::from_file_or_default("valet.conf");

    let cache = Arc::new(ResponseCache::new());
    let passcode = Arc::new(Passcode::new(cfg.auth.passcode.clone()));
    let router = routes::build_router(Arc::new(OfflineAssistant), cache.clone(), passcode.clone());

    let state = Arc::new(AppState {
        cfg,
        router,
        cache,
        passcode,
    });

    let (server, handle) = Server::bind(state).await?;
    info!(target: "valet", addr = %server.local_addr()?, "valet listening");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "valet", "Interrupt received; stopping");
            handle.stop();
        }
    });

    server.run().await
}
