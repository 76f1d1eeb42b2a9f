//! Fast tier: recency-ordered bounded store
//!
//! The short-lived working set. Bounded by capacity; inserting into a full
//! tier evicts the least-recently-used resident. Retrieval refreshes recency
//! and access bookkeeping.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::item::{MemoryId, MemoryItem};

/// Default capacity when none (or zero) is configured.
const DEFAULT_CAPACITY: usize = 100;

/// Recency-ordered, capacity-bounded memory tier.
pub struct FastTier {
    items: LruCache<MemoryId, MemoryItem>,
}

impl FastTier {
    /// Create a tier with the given capacity. Zero falls back to the default.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Self {
            items: LruCache::new(capacity),
        }
    }

    /// Insert or overwrite an item, marking it most-recently-used.
    ///
    /// Returns the least-recently-used resident when the insert pushed the
    /// tier past capacity. Insertion itself never fails.
    pub fn put(&mut self, item: MemoryItem) -> Option<MemoryItem> {
        let id = item.id;
        match self.items.push(id, item) {
            Some((evicted_id, evicted)) if evicted_id != id => {
                log::debug!("evicted from fast tier: {evicted_id}");
                Some(evicted)
            }
            // Same-key replacement is an overwrite, not an eviction.
            _ => None,
        }
    }

    /// Retrieve an item, updating access bookkeeping and recency on hit.
    pub fn get(&mut self, id: &MemoryId) -> Option<&mut MemoryItem> {
        let item = self.items.get_mut(id)?;
        item.touch();
        Some(item)
    }

    /// Read an item without touching bookkeeping or recency.
    pub fn peek(&self, id: &MemoryId) -> Option<&MemoryItem> {
        self.items.peek(id)
    }

    /// Mutable read without recency promotion (decay sweeps, associations).
    pub fn peek_mut(&mut self, id: &MemoryId) -> Option<&mut MemoryItem> {
        self.items.peek_mut(id)
    }

    /// Remove an item, returning it if present.
    pub fn remove(&mut self, id: &MemoryId) -> Option<MemoryItem> {
        self.items.pop(id)
    }

    pub fn contains(&self, id: &MemoryId) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.cap().get()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate residents, most-recently-used first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.iter().map(|(_, item)| item)
    }

    /// Mutable iteration without recency changes (decay sweeps).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MemoryItem> {
        self.items.iter_mut().map(|(_, item)| item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::MemoryKind;

    fn item(importance: f64) -> MemoryItem {
        MemoryItem::new(serde_json::json!("x"), vec![], importance, MemoryKind::Fast)
    }

    #[test]
    fn test_put_and_get() {
        let mut tier = FastTier::new(10);
        let stored = item(0.5);
        let id = stored.id;

        assert!(tier.put(stored).is_none());
        let got = tier.get(&id).unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got.access_count, 1);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let tier = FastTier::new(0);
        assert_eq!(tier.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut tier = FastTier::new(2);
        let a = item(0.1);
        let b = item(0.1);
        let c = item(0.1);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);

        assert!(tier.put(a).is_none());
        assert!(tier.put(b).is_none());
        let evicted = tier.put(c).unwrap();

        assert_eq!(evicted.id, a_id);
        assert!(!tier.contains(&a_id));
        assert!(tier.contains(&b_id));
        assert!(tier.contains(&c_id));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut tier = FastTier::new(2);
        let a = item(0.1);
        let b = item(0.1);
        let c = item(0.1);
        let (a_id, b_id) = (a.id, b.id);

        tier.put(a);
        tier.put(b);
        // Touch A so B becomes the LRU entry.
        tier.get(&a_id);
        let evicted = tier.put(c).unwrap();

        assert_eq!(evicted.id, b_id);
        assert!(tier.contains(&a_id));
    }

    #[test]
    fn test_overwrite_is_not_eviction() {
        let mut tier = FastTier::new(1);
        let a = item(0.1);
        let mut a2 = a.clone();
        a2.importance = 0.9;

        assert!(tier.put(a).is_none());
        assert!(tier.put(a2).is_none());
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut tier = FastTier::new(10);
        let a = item(0.5);
        let id = a.id;

        tier.put(a);
        assert!(tier.remove(&id).is_some());
        assert!(tier.remove(&id).is_none());
        assert!(tier.is_empty());
    }

    #[test]
    fn test_peek_does_not_touch() {
        let mut tier = FastTier::new(10);
        let a = item(0.5);
        let id = a.id;

        tier.put(a);
        assert_eq!(tier.peek(&id).unwrap().access_count, 0);
        tier.get(&id);
        assert_eq!(tier.peek(&id).unwrap().access_count, 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut tier = FastTier::new(3);
        for _ in 0..20 {
            tier.put(item(0.5));
            assert!(tier.len() <= 3);
        }
    }
}
