//! HTTP surface for the latest counter reading.
//!
//! Exposes the reading as JSON at `/api/latest`, a status page at `/`, and a
//! health check at `/api/health`. Handlers only ever take snapshots of the
//! [`StateStore`]; they never write to it.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::{DeviceConfig, WebConfig};
pub use router::create_app;

use crate::error::{CounterError, Result};
use crate::telemetry::StateStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StateStore,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(store: StateStore, config: WebConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Start the web server and serve until `shutdown` resolves.
pub async fn start_web_server<F>(config: WebConfig, store: StateStore, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| CounterError::config_error(format!("Invalid bind address: {}", e)))?;

    let app = create_app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CounterError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Smart Counter server listening on http://{}", addr);
    info!("Status page: http://{}/", addr);
    info!("API endpoint: http://{}/api/latest", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CounterError::web_server_error(format!("Server error: {}", e)))?;

    info!("Web server stopped");
    Ok(())
}
