//! HTTP surface for the dashboard: JSON endpoints over [`ergo_dash::Dashboard`].

mod routes;

pub use routes::{router, AppState, Health};

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("serve: {0}")]
    Serve(std::io::Error),
}

pub struct ApiServer {
    state: AppState,
    addr: SocketAddr,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    pub fn new(state: AppState, addr: SocketAddr, static_dir: Option<PathBuf>) -> Self {
        Self {
            state,
            addr,
            static_dir,
        }
    }

    /// Serve until Ctrl-C.
    pub async fn start(self) -> Result<(), ServerError> {
        let app = router(self.state, self.static_dir.as_deref());
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Bind(self.addr, e))?;
        info!(addr = %self.addr, "API server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)?;
        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
}
