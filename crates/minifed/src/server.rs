//! HTTP listener for the whole federation.

use axum::Router;
use minifed_core::{FedError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Serve `app` on `listen` until interrupted.
pub async fn serve(listen: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| FedError::Server(format!("TCP bind {listen}: {e}")))?;
    let addr = listener.local_addr().unwrap_or(listen);
    info!(%addr, "minifed listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FedError::Server(format!("server error: {e}")))?;

    info!("minifed stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
