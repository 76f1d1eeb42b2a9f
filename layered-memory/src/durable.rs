//! Durable tier: importance-gated bounded store
//!
//! The "worth keeping" set. Admission is gated by an importance threshold;
//! when full, the resident with the globally lowest importance is evicted to
//! make room.

use std::collections::HashMap;

use crate::item::{MemoryId, MemoryItem};

/// Default capacity when none (or zero) is configured.
const DEFAULT_CAPACITY: usize = 10_000;

/// Default admission threshold.
pub const DEFAULT_IMPORTANCE_THRESHOLD: f64 = 0.3;

/// Outcome of a durable-tier insert attempt.
pub enum DurablePut {
    /// Item admitted; carries the resident evicted to make room, if any.
    Stored(Option<MemoryItem>),
    /// Item below the importance threshold; handed back untouched.
    Rejected(MemoryItem),
}

/// Importance-gated, capacity-bounded memory tier.
pub struct DurableTier {
    items: HashMap<MemoryId, MemoryItem>,
    capacity: usize,
    importance_threshold: f64,
}

impl DurableTier {
    /// Create a tier with the given capacity and admission threshold.
    /// Zero capacity falls back to the default; the threshold is clamped.
    pub fn new(capacity: usize, importance_threshold: f64) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            items: HashMap::new(),
            capacity,
            importance_threshold: importance_threshold.clamp(0.0, 1.0),
        }
    }

    /// Attempt to insert or overwrite an item.
    ///
    /// Items below the importance threshold are rejected without mutating
    /// state. At capacity, some resident with the minimum importance is
    /// evicted first; which one among equals is unspecified.
    pub fn put(&mut self, item: MemoryItem) -> DurablePut {
        if item.importance < self.importance_threshold {
            return DurablePut::Rejected(item);
        }

        let evicted = if self.items.len() >= self.capacity && !self.items.contains_key(&item.id) {
            self.evict_least_important()
        } else {
            None
        };

        self.items.insert(item.id, item);
        DurablePut::Stored(evicted)
    }

    /// Retrieve an item, updating access bookkeeping on hit.
    pub fn get(&mut self, id: &MemoryId) -> Option<&mut MemoryItem> {
        let item = self.items.get_mut(id)?;
        item.touch();
        Some(item)
    }

    /// Read an item without touching bookkeeping.
    pub fn peek(&self, id: &MemoryId) -> Option<&MemoryItem> {
        self.items.get(id)
    }

    /// Mutable read without access bookkeeping (decay sweeps, associations).
    pub fn peek_mut(&mut self, id: &MemoryId) -> Option<&mut MemoryItem> {
        self.items.get_mut(id)
    }

    /// Remove an item, returning it if present.
    pub fn remove(&mut self, id: &MemoryId) -> Option<MemoryItem> {
        self.items.remove(id)
    }

    pub fn contains(&self, id: &MemoryId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn importance_threshold(&self) -> f64 {
        self.importance_threshold
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MemoryItem> {
        self.items.values_mut()
    }

    fn evict_least_important(&mut self) -> Option<MemoryItem> {
        let victim_id = self
            .items
            .values()
            .min_by(|a, b| {
                a.importance
                    .partial_cmp(&b.importance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|item| item.id)?;

        let victim = self.items.remove(&victim_id);
        log::debug!("evicted from durable tier: {victim_id}");
        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::MemoryKind;

    fn item(importance: f64) -> MemoryItem {
        MemoryItem::new(
            serde_json::json!("x"),
            vec![],
            importance,
            MemoryKind::Durable,
        )
    }

    #[test]
    fn test_rejects_below_threshold() {
        let mut tier = DurableTier::new(10, 0.3);
        let low = item(0.2);
        let id = low.id;

        match tier.put(low) {
            DurablePut::Rejected(returned) => assert_eq!(returned.id, id),
            DurablePut::Stored(_) => panic!("expected rejection"),
        }
        assert!(tier.is_empty());
    }

    #[test]
    fn test_admits_at_threshold() {
        let mut tier = DurableTier::new(10, 0.3);
        let at = item(0.3);
        let id = at.id;

        assert!(matches!(tier.put(at), DurablePut::Stored(None)));
        assert!(tier.contains(&id));
    }

    #[test]
    fn test_evicts_least_important_at_capacity() {
        let mut tier = DurableTier::new(2, 0.3);
        let weak = item(0.4);
        let strong = item(0.9);
        let weak_id = weak.id;

        tier.put(weak);
        tier.put(strong);

        match tier.put(item(0.8)) {
            DurablePut::Stored(Some(evicted)) => assert_eq!(evicted.id, weak_id),
            _ => panic!("expected eviction of least important"),
        }
        assert_eq!(tier.len(), 2);
        assert!(!tier.contains(&weak_id));
    }

    #[test]
    fn test_tie_break_removes_some_minimum() {
        let mut tier = DurableTier::new(2, 0.3);
        let a = item(0.5);
        let b = item(0.5);
        let (a_id, b_id) = (a.id, b.id);

        tier.put(a);
        tier.put(b);

        // Both residents share the minimum; exactly one of them must go.
        match tier.put(item(0.9)) {
            DurablePut::Stored(Some(evicted)) => {
                assert!(evicted.id == a_id || evicted.id == b_id);
                assert_eq!((evicted.importance * 10.0) as u32, 5);
            }
            _ => panic!("expected an eviction"),
        }
        assert_eq!(tier.len(), 2);
        assert!(tier.contains(&a_id) ^ tier.contains(&b_id));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut tier = DurableTier::new(1, 0.3);
        let a = item(0.5);
        let mut a2 = a.clone();
        a2.importance = 0.7;

        tier.put(a);
        assert!(matches!(tier.put(a2), DurablePut::Stored(None)));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_get_bookkeeping() {
        let mut tier = DurableTier::new(10, 0.3);
        let a = item(0.5);
        let id = a.id;

        tier.put(a);
        tier.get(&id);
        tier.get(&id);
        assert_eq!(tier.peek(&id).unwrap().access_count, 2);
    }

    #[test]
    fn test_remove() {
        let mut tier = DurableTier::new(10, 0.3);
        let a = item(0.5);
        let id = a.id;

        tier.put(a);
        assert!(tier.remove(&id).is_some());
        assert!(tier.remove(&id).is_none());
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let tier = DurableTier::new(0, 0.3);
        assert_eq!(tier.capacity(), DEFAULT_CAPACITY);
    }
}
