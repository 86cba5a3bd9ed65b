//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. Every problem is
//! collected so the operator sees them all at once.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be at least 1")]
    ZeroConnections,

    #[error("listener.max_request_bytes must be at least 16")]
    RequestLimitTooSmall,

    #[error("timeouts.read_secs must be greater than 0")]
    ZeroReadTimeout,

    #[error("exec.shell must not be empty in shell mode")]
    EmptyShell,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }
    if config.listener.max_request_bytes < 16 {
        errors.push(ValidationError::RequestLimitTooSmall);
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if config.exec.mode == crate::config::ExecMode::Shell && config.exec.shell.trim().is_empty() {
        errors.push(ValidationError::EmptyShell);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
