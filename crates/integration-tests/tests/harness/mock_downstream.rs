//! Mock downstream service for integration tests
//!
//! `GET /status/{code}` answers with that status and a short text body

use std::net::SocketAddr;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Router, routing};
use tokio_util::sync::CancellationToken;

/// Mock downstream that returns whatever status it is asked for
pub struct MockDownstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl MockDownstream {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let app = Router::new().route("/status/{code}", routing::get(handle_status));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown })
    }

    /// Base URL of the mock server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockDownstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Base URL nothing is listening on
pub async fn unreachable_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

async fn handle_status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, format!("downstream says {code}"))
}
