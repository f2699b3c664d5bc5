//! HTTP host for the load collector.
//!
//! Exposes the plugin entry points (metric discovery, collection, config
//! policy and metadata) as JSON endpoints so a remote scheduler can drive
//! the collector.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{LoadError, Result};
use crate::metrics::{LoadCollector, LoadSource};
use std::net::SocketAddr;
use tracing::info;

/// Start the web server with the provided configuration and collector.
pub async fn start_web_server<S: LoadSource + 'static>(
    config: WebConfig,
    collector: LoadCollector<S>,
) -> Result<()> {
    let app = create_app(&config, collector);

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| LoadError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Starting load collector on http://{}", addr);
    info!("Metric types: POST http://{}/v1/metric-types", addr);
    info!("Collection: POST http://{}/v1/collect", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
