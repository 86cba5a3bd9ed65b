//! Local-only HTTP gateway for running shell commands from a browser.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser ──▶ net::listener ──▶ net::guard ──▶ http::request ──▶ http::dispatcher
//!                 (slots, accept)   (loopback?)    (bounded read)    (prefix routing)
//!                                        │                                 │
//!                                        ▼ 403                             ▼
//!                                                               http::form → exec
//!                                                               (decode)    (spawn, capture)
//!                                                                              │
//!     Browser ◀── http::response ◀── http::pages ◀─────────────────────────────┘
//!                 (framing)          (<pre> output)
//! ```
//!
//! Cross-cutting: `config` (TOML), `menu` (presets), `lifecycle` (startup,
//! signals, shutdown), `observability` (tracing, metrics).
//!
//! Any client that passes the loopback check can run arbitrary commands with
//! the gateway's privileges. That is the purpose of the tool.

pub mod config;
pub mod exec;
pub mod http;
pub mod lifecycle;
pub mod menu;
pub mod net;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
