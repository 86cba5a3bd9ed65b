//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use shell_gateway::config::GatewayConfig;
use shell_gateway::http::ConnectionHandler;
use shell_gateway::lifecycle::startup;
use shell_gateway::Shutdown;

/// A gateway running on an ephemeral loopback port.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handler: Arc<ConnectionHandler>,
    pub task: JoinHandle<()>,
}

/// Config bound to `127.0.0.1:0` with no menu file.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.menu.path = "/nonexistent/progman.ini".to_string();
    config.exec.timeout_secs = 10;
    config.timeouts.read_secs = 2;
    config
}

/// Start a gateway and wait until it accepts connections.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let (server, listener) = startup::start(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = server.handler();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    let task = tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    TestGateway {
        addr,
        shutdown,
        handler,
        task,
    }
}

/// Send raw bytes and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(15), stream.read_to_end(&mut out))
        .await
        .expect("gateway did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

/// Build a urlencoded `POST /run` request.
#[allow(dead_code)]
pub fn post_run(body: &str) -> Vec<u8> {
    format!(
        "POST /run HTTP/1.1\r\n\
         Host: localhost\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
    .into_bytes()
}

/// Split a response into status line and body.
#[allow(dead_code)]
pub fn split_response(response: &str) -> (&str, &str) {
    let status = response.lines().next().unwrap_or("");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("");
    (status, body)
}
