//! Layered Memory
//!
//! Two-tier in-process memory store for AI agents: a small recency-ordered
//! fast tier in front of a larger importance-gated durable tier, with
//! automatic promotion, time-based decay, associative links, and tag/kind
//! indexed queries.
//!
//! ## Features
//!
//! - **Tiered placement** - Important or explicitly durable content skips the
//!   fast tier and lands in durable storage directly
//! - **Consolidation** - A background sweep moves hot or important fast-tier
//!   items into the durable tier
//! - **Decay** - Unaccessed items fade over time and are eventually forgotten,
//!   slower the more important they are
//! - **Associations** - Symmetric links between items, resolved on demand
//! - **Observers** - Synchronous lifecycle callbacks for stores, promotions,
//!   evictions, and deletions
//!
//! ## Example
//!
//! ```ignore
//! use layered_memory::{MemoryKind, MemoryOptions, MemorySystem, QuerySpec};
//!
//! let memory = MemorySystem::new(MemoryOptions::default());
//!
//! let id = memory.store(
//!     "the /upload endpoint fails on large payloads",
//!     vec!["nginx".to_string()],
//!     0.8,
//!     MemoryKind::Fast,
//! );
//!
//! let hits = memory.query(&QuerySpec {
//!     tags: vec!["nginx".to_string()],
//!     ..Default::default()
//! });
//! assert_eq!(hits[0].id, id);
//! ```

pub mod durable;
pub mod error;
pub mod events;
pub mod fast;
pub mod index;
pub mod item;
pub mod query;
pub mod system;

// Re-exports for convenience
pub use durable::{DurablePut, DurableTier};
pub use error::{MemoryError, Result};
pub use events::{MemoryObserver, ObserverHandle};
pub use fast::FastTier;
pub use item::{MemoryId, MemoryItem, MemoryKind};
pub use query::{ImportanceRange, QuerySpec, SortKey, TimeRange};
pub use system::{MemoryOptions, MemoryStats, MemorySystem};
