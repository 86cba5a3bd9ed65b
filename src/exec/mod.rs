//! Command execution subsystem.
//!
//! # Data Flow
//! ```text
//! decoded command string
//!     → executor.rs (shell or argv spawn, stdout+stderr piped)
//!     → buffer.rs (chunks appended in arrival order, capacity doubles)
//!     → CapturedOutput (bytes, exit status, timeout/truncation flags)
//! ```
//!
//! # Design Decisions
//! - Shell mode is the default: the string reaches the shell unescaped
//! - Children are killed on drop and always reaped
//! - Timeout and output cap are optional; both default to permissive values

pub mod buffer;
pub mod executor;

pub use buffer::OutputBuffer;
pub use executor::{CapturedOutput, ExecError, Executor};
