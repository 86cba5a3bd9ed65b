//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection slots)
//!     → guard.rs (loopback-only origin check)
//!     → connection.rs (connection ID, lifecycle tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - A slot is taken before accept, so one slot means strictly sequential service
//! - The origin check runs before any request byte is read
//! - Each connection is tracked for graceful shutdown

pub mod connection;
pub mod guard;
pub mod listener;

pub use connection::{ConnectionContext, ConnectionId, ConnectionTracker};
pub use guard::is_local;
pub use listener::{Listener, ListenerError};
