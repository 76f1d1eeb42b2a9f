//! Secondary indices for filtered lookup
//!
//! Tag and kind buckets maintained by the coordinator on every tier
//! insert/remove. Purely derived state: every id in a bucket corresponds to
//! a live item in exactly one tier.

use std::collections::{HashMap, HashSet};

use crate::item::{MemoryId, MemoryItem, MemoryKind};

/// Tag and kind buckets shared across both tiers.
#[derive(Default)]
pub struct MemoryIndex {
    tags: HashMap<String, HashSet<MemoryId>>,
    kinds: HashMap<MemoryKind, HashSet<MemoryId>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item's id to every relevant tag bucket and its kind bucket.
    pub fn insert(&mut self, item: &MemoryItem) {
        for tag in &item.tags {
            self.tags.entry(tag.clone()).or_default().insert(item.id);
        }
        self.kinds.entry(item.kind).or_default().insert(item.id);
    }

    /// Remove an item's id from all buckets, dropping buckets that empty out.
    pub fn remove(&mut self, item: &MemoryItem) {
        for tag in &item.tags {
            if let Some(bucket) = self.tags.get_mut(tag) {
                bucket.remove(&item.id);
                if bucket.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
        if let Some(bucket) = self.kinds.get_mut(&item.kind) {
            bucket.remove(&item.id);
            if bucket.is_empty() {
                self.kinds.remove(&item.kind);
            }
        }
    }

    /// Union of the buckets for the given tags (any-of semantics).
    pub fn ids_with_any_tag(&self, tags: &[String]) -> HashSet<MemoryId> {
        let mut ids = HashSet::new();
        for tag in tags {
            if let Some(bucket) = self.tags.get(tag) {
                ids.extend(bucket.iter().copied());
            }
        }
        ids
    }

    /// Union of the buckets for the given kinds.
    pub fn ids_with_any_kind(&self, kinds: &[MemoryKind]) -> HashSet<MemoryId> {
        let mut ids = HashSet::new();
        for kind in kinds {
            if let Some(bucket) = self.kinds.get(kind) {
                ids.extend(bucket.iter().copied());
            }
        }
        ids
    }

    /// Ids carrying a specific tag.
    pub fn ids_with_tag(&self, tag: &str) -> Option<&HashSet<MemoryId>> {
        self.tags.get(tag)
    }

    /// Number of distinct tags currently indexed.
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.kinds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(tags: &[&str], kind: MemoryKind) -> MemoryItem {
        MemoryItem::new(
            serde_json::json!("x"),
            tags.iter().map(|t| t.to_string()).collect(),
            0.5,
            kind,
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = MemoryIndex::new();
        let a = item(&["rust", "memory"], MemoryKind::Fast);
        let b = item(&["rust"], MemoryKind::Episodic);
        index.insert(&a);
        index.insert(&b);

        let rust = index.ids_with_any_tag(&["rust".to_string()]);
        assert_eq!(rust.len(), 2);

        let memory = index.ids_with_any_tag(&["memory".to_string()]);
        assert_eq!(memory.len(), 1);
        assert!(memory.contains(&a.id));

        let episodic = index.ids_with_any_kind(&[MemoryKind::Episodic]);
        assert_eq!(episodic.len(), 1);
        assert!(episodic.contains(&b.id));
    }

    #[test]
    fn test_any_of_union_semantics() {
        let mut index = MemoryIndex::new();
        let a = item(&["x"], MemoryKind::Fast);
        let b = item(&["y"], MemoryKind::Fast);
        index.insert(&a);
        index.insert(&b);

        let both = index.ids_with_any_tag(&["x".to_string(), "y".to_string()]);
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut index = MemoryIndex::new();
        let a = item(&["solo"], MemoryKind::Procedural);
        index.insert(&a);
        index.remove(&a);

        assert!(index.ids_with_tag("solo").is_none());
        assert_eq!(index.tag_count(), 0);
        assert!(index.ids_with_any_kind(&[MemoryKind::Procedural]).is_empty());
    }

    #[test]
    fn test_remove_keeps_shared_buckets() {
        let mut index = MemoryIndex::new();
        let a = item(&["shared"], MemoryKind::Fast);
        let b = item(&["shared"], MemoryKind::Fast);
        index.insert(&a);
        index.insert(&b);
        index.remove(&a);

        let bucket = index.ids_with_tag("shared").unwrap();
        assert_eq!(bucket.len(), 1);
        assert!(bucket.contains(&b.id));
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        let index = MemoryIndex::new();
        assert!(index.ids_with_any_tag(&["nothing".to_string()]).is_empty());
    }
}
