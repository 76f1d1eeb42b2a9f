//! Query types and filtering
//!
//! Declarative filter applied across both tiers. Candidate gathering via the
//! indices lives in the coordinator; the scalar filters and ordering live
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{MemoryItem, MemoryKind};

/// Inclusive creation-time window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Inclusive importance window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportanceRange {
    pub min: f64,
    pub max: f64,
}

/// Sort key for query results. Always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Creation time, newest first
    Timestamp,
    /// Importance score
    #[default]
    Importance,
    /// Retrieval count
    AccessCount,
    /// Aliased to importance; no scoring function is implemented
    Relevance,
}

/// Filter for [`crate::MemorySystem::query`].
///
/// Empty `kinds`/`tags` match everything; `tags` is any-of. Decayed items
/// (`decay <= 0.1`) are excluded unless `include_decayed` is set.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub kinds: Vec<MemoryKind>,
    pub tags: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub importance: Option<ImportanceRange>,
    pub include_decayed: bool,
    pub limit: Option<usize>,
    pub sort_by: SortKey,
}

impl QuerySpec {
    /// Whether an item passes the scalar filters (time, importance, decay).
    ///
    /// Kind and tag restrictions are resolved through the indices before
    /// items are materialized, so they are not re-checked here.
    pub fn matches(&self, item: &MemoryItem) -> bool {
        if let Some(range) = &self.time_range {
            if item.created_at < range.start || item.created_at > range.end {
                return false;
            }
        }
        if let Some(range) = &self.importance {
            if item.importance < range.min || item.importance > range.max {
                return false;
            }
        }
        if !self.include_decayed && item.is_decayed() {
            return false;
        }
        true
    }

    /// Sort results descending by the configured key.
    pub fn sort(&self, results: &mut [MemoryItem]) {
        results.sort_by(|a, b| match self.sort_by {
            SortKey::Timestamp => b.created_at.cmp(&a.created_at),
            SortKey::AccessCount => b.access_count.cmp(&a.access_count),
            SortKey::Importance | SortKey::Relevance => b
                .importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal),
        });
    }
}
