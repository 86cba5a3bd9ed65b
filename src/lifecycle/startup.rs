//! Startup orchestration.
//!
//! Order: metrics exporter, menu, server, listener. Any error here is fatal
//! and happens before the first connection is accepted.

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::GatewayServer;
use crate::menu::load_menu_or_empty;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Build the server and bind its listener.
pub async fn start(config: &GatewayConfig) -> Result<(GatewayServer, Listener), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let menu = load_menu_or_empty(Path::new(&config.menu.path));
    let server = GatewayServer::new(config, menu);
    let listener = Listener::bind(&config.listener).await?;

    Ok((server, listener))
}
