//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (origin already checked)
//!     → request.rs (bounded read, deadline, Content-Length)
//!     → dispatcher.rs (prefix routing, cmd extraction)
//!     → form.rs (percent-decoding)
//!     → exec (child process, captured output)
//!     → pages.rs (HTML rendering, escaping)
//!     → response.rs (status line, headers, body)
//!     → Send to client, close
//! ```

pub mod dispatcher;
pub mod form;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{Dispatcher, Route};
pub use response::Response;
pub use server::{ConnectionHandler, ConnectionLimits, GatewayServer};
