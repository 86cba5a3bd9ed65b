//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the shell gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Command execution settings.
    pub exec: ExecConfig,

    /// Preset menu file.
    pub menu: MenuConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "[::]:8080"). An IPv6 wildcard binds dual-stack.
    pub bind_address: String,

    /// Maximum connections served at once. 1 keeps the gateway strictly sequential.
    pub max_connections: usize,

    /// Largest request (headers + body) accepted, in bytes.
    pub max_request_bytes: usize,

    /// Listen backlog passed to the socket.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "[::]:8080".to_string(),
            max_connections: 1,
            max_request_bytes: 8192,
            backlog: 10,
        }
    }
}

impl ListenerConfig {
    /// Replace the port of `bind_address`, keeping the host part.
    pub fn set_port(&mut self, port: u16) {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, _)) if !host.is_empty() => host.to_string(),
            _ => "[::]".to_string(),
        };
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// Timeout configuration for the connection lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for reading a complete request, in seconds.
    pub read_secs: u64,

    /// Deadline for writing the response, in seconds.
    pub write_secs: u64,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            write_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// How the submitted command string reaches the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Pass the string verbatim to the shell (`sh -c`, `cmd.exe /C`).
    #[default]
    Shell,
    /// Split on whitespace and spawn the program directly, no shell.
    Argv,
}

/// Command execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Shell mode or argument-vector mode.
    pub mode: ExecMode,

    /// Shell program used in shell mode.
    pub shell: String,

    /// Flag that makes the shell run the next argument as a command.
    pub shell_flag: String,

    /// Kill the child after this many seconds. 0 disables the limit.
    pub timeout_secs: u64,

    /// Stop capturing after this many bytes. 0 means unbounded.
    pub max_output_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        let (shell, shell_flag) = if cfg!(windows) {
            ("cmd.exe", "/C")
        } else {
            ("/bin/sh", "-c")
        };
        Self {
            mode: ExecMode::Shell,
            shell: shell.to_string(),
            shell_flag: shell_flag.to_string(),
            timeout_secs: 60,
            max_output_bytes: 0,
        }
    }
}

/// Menu file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Path of the `caption|command` preset file.
    pub path: String,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            path: "progman.ini".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "shell_gateway=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
