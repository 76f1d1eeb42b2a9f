//! Memory item types
//!
//! Core record type for the layered memory store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for memory items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random MemoryId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MemoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Classification hint for a memory item.
///
/// Independent of which tier currently holds the item: an `Episodic` item may
/// live in either tier, and a `Fast` item can still be promoted into the
/// durable tier by the consolidation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Working context with fast access and natural turnover
    #[default]
    Fast,
    /// Knowledge worth keeping; placed directly into the durable tier
    Durable,
    /// Specific events and experiences
    Episodic,
    /// Skills and process knowledge
    Procedural,
}

impl MemoryKind {
    /// All kinds, for per-kind stats buckets.
    pub const ALL: [MemoryKind; 4] = [
        MemoryKind::Fast,
        MemoryKind::Durable,
        MemoryKind::Episodic,
        MemoryKind::Procedural,
    ];
}

/// A single stored memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique identifier, assigned at creation
    pub id: MemoryId,
    /// Opaque payload; this subsystem never inspects it
    pub content: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last successful retrieve
    pub last_accessed: DateTime<Utc>,
    /// Incremented on every successful retrieve
    pub access_count: u64,
    /// Searchable tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Placement/eviction score, clamped to [0,1]
    pub importance: f64,
    /// Classification hint
    pub kind: MemoryKind,
    /// Health value; starts at 1.0 and only decreases without access
    pub decay: f64,
    /// Symmetric links to other items
    #[serde(default)]
    pub associations: HashSet<MemoryId>,
}

impl MemoryItem {
    /// Create a new item with a fresh id and full decay health.
    ///
    /// Importance outside [0,1] is clamped, not rejected.
    pub fn new(
        content: serde_json::Value,
        tags: Vec<String>,
        importance: f64,
        kind: MemoryKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MemoryId::new(),
            content,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            tags,
            importance: importance.clamp(0.0, 1.0),
            kind,
            decay: 1.0,
            associations: HashSet::new(),
        }
    }

    /// Record a successful retrieve.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count += 1;
    }

    /// Whether the item has decayed past the default query visibility cutoff.
    pub fn is_decayed(&self) -> bool {
        self.decay <= 0.1
    }
}
