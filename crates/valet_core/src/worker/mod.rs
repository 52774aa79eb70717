//! Per-connection HTTP/1 handler.
//!
//! Owns the full request/response lifecycle for one accepted connection:
//! read, public-path check, auth, dispatch, write, close. Every exit path
//! drops the stream, so the connection resource is released whether the
//! request succeeded, failed to decode, failed auth, or blew up in a
//! handler. One request per connection; no keep-alive.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Duration;
use tracing::{debug, info, instrument, warn};
use valet_http::{Request, Response};

use crate::state::AppState;

mod assets;
mod request;
mod timeouts;

use assets::serve_index;
use request::read_http_request;
use timeouts::write_all_timed;

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Entry point for the task that handles a single connection.
#[instrument(
    skip(stream, state),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    let read_timeout = Duration::from_secs(state.cfg.http.client_read_timeout_secs);
    let write_timeout = Duration::from_secs(state.cfg.http.client_write_timeout_secs);

    // Garbage input degrades to silence: no response, just close.
    let Some(req) = read_http_request(&mut stream, read_timeout).await? else {
        debug!(target: "valet::worker", "No request; closing connection");
        return Ok(());
    };

    info!(
        target: "valet::worker",
        method = %req.method,
        path = %req.path,
        "Handling request"
    );

    let response = respond(&state, req).await;
    let wire = response.encode();
    if !write_all_timed(&mut stream, &wire, write_timeout).await? {
        warn!(target: "valet::worker", "Response write timed out");
    }
    Ok(())
}

/// Auth and routing for one parsed request.
async fn respond(state: &AppState, req: Request) -> Response {
    if state.router.is_public(&req.path) {
        return serve_index(&state.cfg.ui).await;
    }

    if !state.passcode.authorize(&req) {
        warn!(
            target: "valet::worker",
            path = %req.path,
            "Rejected request with missing or wrong credential"
        );
        return Response::error(401, "unauthorized");
    }

    state.router.dispatch(req).await
}
