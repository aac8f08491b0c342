//! Fragment output cache for server-rendered content.
//!
//! This crate provides:
//! - `DynamicCache` - Stores fragments under keys derived from their dimensions
//! - `CacheSession` - Per-request resolution with a local memo and scope tracking
//! - `CacheKey` - Canonical, order-independent cache key derivation
//! - `placeholder` - The `[[cache esi='...']]` marker codec and scanner
//! - `BackingStore` / `MemoryStore` - Byte store seam with sliding and absolute expiration
//! - `Tagger` / `MemoryTagIndex` / `LazyTagger` - Tagging for bulk invalidation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edge_cache::{DynamicCache, MemoryStore, MemoryTagIndex};
//! use edge_core::{CacheContext, StaticDimensions};
//!
//! let cache = DynamicCache::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticDimensions::new().with("culture", "en")),
//!     Arc::new(MemoryTagIndex::new()),
//! );
//!
//! let mut session = cache.session();
//! let leaf = CacheContext::new("menu").vary_by("culture");
//! session.set(&leaf, "<nav/>").await?;
//!
//! let marker = edge_cache::placeholder::encode(&leaf)?;
//! session.set(&CacheContext::new("page"), &format!("<body>{marker}</body>")).await?;
//!
//! assert_eq!(session.get("page").await?.as_deref(), Some("<body><nav/></body>"));
//! ```

mod engine;
mod error;
mod flight;
mod key;
mod memo;
pub mod placeholder;
mod session;
mod store;
mod tags;

pub use engine::*;
pub use error::*;
pub use flight::*;
pub use key::*;
pub use memo::*;
pub use session::*;
pub use store::*;
pub use tags::*;
