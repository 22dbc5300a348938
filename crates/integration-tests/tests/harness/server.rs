//! Test server wrapper that starts the orders API on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use backstop_config::Config;
use tokio_util::sync::CancellationToken;

use super::app;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server whose inventory calls go nowhere
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let inventory_url = super::mock_downstream::unreachable_url().await?;
        Self::start_with_inventory(config, inventory_url).await
    }

    /// Start a test server with the given configuration and inventory service
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start_with_inventory(config: Config, inventory_url: String) -> anyhow::Result<Self> {
        let resolver = Arc::new(config.resolver()?);
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app::router(resolver, inventory_url))
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
