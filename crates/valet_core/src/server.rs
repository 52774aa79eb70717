use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, instrument};

use crate::state::AppState;
use crate::worker::handle_connection;

/// Signals the accept loop to stop. In-flight connections are not
/// forcibly terminated.
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
}

impl ServerHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Owns the listening socket and the accept loop.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    semaphore: Arc<Semaphore>,
    shutdown: watch::Receiver<bool>,
}

impl Server {
    /// Binds the configured address and prepares the admission semaphore.
    pub async fn bind(state: Arc<AppState>) -> anyhow::Result<(Server, ServerHandle)> {
        let listen_addr = state.cfg.http.listen.clone();
        info!(
            target: "valet::server",
            listen = %listen_addr,
            "Binding listener"
        );

        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(listener) => {
                info!(
                    target: "valet::server",
                    listen = %listen_addr,
                    "Bind() successful"
                );
                listener
            }
            Err(e) => {
                error!(
                    target: "valet::server",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to bind listener"
                );
                return Err(e.into());
            }
        };

        let max_conns = state.cfg.global.max_connections as usize;
        let semaphore = Arc::new(Semaphore::new(max_conns));
        info!(
            target: "valet::server",
            max_conns,
            "Connection admission semaphore initialized"
        );

        let (tx, rx) = watch::channel(false);
        let server = Server {
            listener,
            state,
            semaphore,
            shutdown: rx,
        };
        Ok((server, ServerHandle { shutdown: tx }))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until stopped.
    ///
    /// Each accepted connection takes a semaphore permit and runs on its
    /// own task; the loop never waits on a connection being handled. A
    /// failed accept is logged and the loop continues.
    #[instrument(skip(self), fields(listen = %self.state.cfg.http.listen))]
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(target: "valet::server", "Accept loop started");

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    match changed {
                        Ok(()) if *self.shutdown.borrow() => {
                            info!(target: "valet::server", "Stop requested; closing listener");
                            break;
                        }
                        Ok(()) => continue,
                        // Handle dropped: nothing can stop us later, treat as stop.
                        Err(_) => break,
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(
                                target: "valet::server",
                                error = ?e,
                                "Failed to accept connection"
                            );
                            continue;
                        }
                    };

                    let permit = match self.semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            error!(
                                target: "valet::server",
                                error = ?e,
                                "Failed to acquire connection permit"
                            );
                            continue;
                        }
                    };

                    debug!(
                        target: "valet::server",
                        client_addr = %addr,
                        available_permits = self.semaphore.available_permits(),
                        "Connection accepted"
                    );

                    let state = self.state.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = handle_connection(Box::new(stream), addr, state).await {
                            error!(
                                target: "valet::worker",
                                client_addr = %addr,
                                error = ?e,
                                "Error while handling connection"
                            );
                        } else {
                            debug!(
                                target: "valet::worker",
                                client_addr = %addr,
                                "Connection handled"
                            );
                        }
                    });
                }
            }
        }

        // Dropping the listener closes the listening socket.
        Ok(())
    }
}
