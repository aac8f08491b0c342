//! Observability infrastructure for the edge fragment cache.
//!
//! This crate provides:
//! - `init` - Global tracing subscriber installation
//! - `LoggingSettings` / `LogFormat` - Log level and output format
//! - `CacheMetrics` - Lock-free hit/miss/write counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
