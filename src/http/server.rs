//! Connection acceptor.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Reject non-loopback peers before reading anything
//! - Read the bounded request, dispatch it, write the response, close
//! - Stop accepting on shutdown and drain in-flight connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::exec::Executor;
use crate::http::dispatcher::Dispatcher;
use crate::http::request::{read_request, RequestError};
use crate::http::response::Response;
use crate::lifecycle::ShutdownSignal;
use crate::menu::Menu;
use crate::net::guard::is_local_peer;
use crate::net::{ConnectionContext, ConnectionId, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;

/// Limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl ConnectionLimits {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_request_bytes: config.listener.max_request_bytes,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
            write_timeout: Duration::from_secs(config.timeouts.write_secs),
        }
    }
}

/// Serves a single connection: guard → read → dispatch → respond.
#[derive(Debug)]
pub struct ConnectionHandler {
    dispatcher: Dispatcher,
    limits: ConnectionLimits,
}

impl ConnectionHandler {
    pub fn new(dispatcher: Dispatcher, limits: ConnectionLimits) -> Self {
        Self { dispatcher, limits }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve one connection to completion.
    ///
    /// The stream is dropped (closed) on every return path.
    pub async fn serve<S>(&self, mut stream: S, ctx: ConnectionContext)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let start = Instant::now();

        if !is_local_peer(&ctx.peer) {
            tracing::info!(peer = %ctx.peer, "Rejected non-loopback client");
            metrics::record_rejection("origin");
            let response = Response::text(StatusCode::FORBIDDEN, "Only localhost allowed\n")
                .with_request_id(ctx.request_id.clone());
            self.respond(&mut stream, "forbidden", response, start).await;
            return;
        }

        let raw = match read_request(
            &mut stream,
            self.limits.max_request_bytes,
            self.limits.read_timeout,
        )
        .await
        {
            Ok(raw) => raw,
            Err(RequestError::Empty) => {
                tracing::debug!("Client closed without sending a request");
                return;
            }
            Err(RequestError::Io(e)) => {
                tracing::debug!(error = %e, "Failed to read request");
                return;
            }
            Err(e @ RequestError::TooLarge { .. }) => {
                tracing::warn!(error = %e, "Request rejected");
                metrics::record_rejection("too_large");
                let response = Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Request too large\n")
                    .with_request_id(ctx.request_id.clone());
                self.respond(&mut stream, "too_large", response, start).await;
                return;
            }
            Err(e @ RequestError::Timeout(_)) => {
                tracing::warn!(error = %e, "Request rejected");
                metrics::record_rejection("read_timeout");
                let response = Response::text(StatusCode::REQUEST_TIMEOUT, "Request timeout\n")
                    .with_request_id(ctx.request_id.clone());
                self.respond(&mut stream, "read_timeout", response, start).await;
                return;
            }
        };

        let (route, response) = self.dispatcher.dispatch(&raw, &ctx).await;
        self.respond(&mut stream, route.as_str(), response, start).await;
    }

    async fn respond<S>(&self, stream: &mut S, route: &'static str, response: Response, start: Instant)
    where
        S: AsyncWrite + Unpin,
    {
        let status = response.status;
        let bytes = response.to_bytes();

        let write = async {
            stream.write_all(&bytes).await?;
            stream.flush().await?;
            stream.shutdown().await
        };

        match tokio::time::timeout(self.limits.write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Failed to write response"),
            Err(_) => tracing::debug!("Timed out writing response"),
        }

        metrics::record_request(route, status.as_u16(), start);
        tracing::debug!(
            route,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Response sent"
        );
    }
}

/// HTTP front end for the gateway.
pub struct GatewayServer {
    handler: Arc<ConnectionHandler>,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl GatewayServer {
    /// Create a new server with the given configuration and preset menu.
    pub fn new(config: &GatewayConfig, menu: Menu) -> Self {
        let executor = Executor::new(config.exec.clone());
        let dispatcher = Dispatcher::new(executor, menu);
        Self {
            handler: Arc::new(ConnectionHandler::new(
                dispatcher,
                ConnectionLimits::from_config(config),
            )),
            tracker: ConnectionTracker::new(),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// Shared handler, mainly for inspection in tests.
    pub fn handler(&self) -> Arc<ConnectionHandler> {
        Arc::clone(&self.handler)
    }

    /// Run the accept loop until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(address = %addr, "Gateway accepting connections");

        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(conn) => conn,
                Err(ListenerError::Closed) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };

            let guard = self.tracker.track();
            let ctx = ConnectionContext::new(guard.id(), peer);
            let handler = Arc::clone(&self.handler);
            let span = connection_span(ctx.id, peer, &ctx.request_id);

            tokio::spawn(
                async move {
                    handler.serve(stream, ctx).await;
                    drop(permit);
                    drop(guard);
                }
                .instrument(span),
            );
        }

        tracing::info!(
            active = self.tracker.active_count(),
            "Shutdown requested, draining connections"
        );
        if !self.tracker.wait_for_drain(self.shutdown_grace).await {
            tracing::warn!(
                active = self.tracker.active_count(),
                "Grace period elapsed with connections still open"
            );
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

fn connection_span(id: ConnectionId, peer: SocketAddr, request_id: &str) -> tracing::Span {
    tracing::info_span!("connection", connection_id = %id, peer = %peer, request_id = %request_id)
}
