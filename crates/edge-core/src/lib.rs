//! Core abstractions for the edge fragment cache.
//!
//! This crate provides the fundamental types and traits:
//! - `CacheContext` - How a fragment varies, expires and is tagged
//! - `Discriminators` - Resolved dimension values for the active request
//! - `DimensionResolver` trait - Request-specific dimension lookup
//! - `ScopeTracker` trait - Active context tracking during resolution
//! - `CacheSettings` - Engine configuration

mod config;
mod context;
mod dimension;
mod scope;

pub use config::*;
pub use context::*;
pub use dimension::*;
pub use scope::*;
