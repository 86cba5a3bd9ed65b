//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Every execution is logged with its command and origin before spawning
//! - Connection and request IDs appear on every per-connection event
//! - Metrics recording is cheap and inert when the exporter is disabled

pub mod logging;
pub mod metrics;
