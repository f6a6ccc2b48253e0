//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! cache, resolver, invalidator produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host process installs
//!     → the confcache CLI installs a fmt subscriber
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder itself
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
