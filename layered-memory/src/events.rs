//! Lifecycle notifications
//!
//! Observer registration for collaborators that react to item lifecycle
//! changes. Delivery is synchronous, inside the operation that caused the
//! change; this is not a durable log.

use std::sync::Arc;

use crate::item::{MemoryId, MemoryItem};

/// Callbacks for item lifecycle events. All methods default to no-ops so
/// observers implement only what they care about.
pub trait MemoryObserver: Send + Sync {
    /// A new item was placed into a tier.
    fn on_stored(&self, _item: &MemoryItem) {}

    /// An item moved from the fast tier into the durable tier.
    fn on_promoted(&self, _item: &MemoryItem) {}

    /// An item was evicted by capacity pressure. Fires before any promotion
    /// attempt; if the item is not promoted it is gone afterwards.
    fn on_evicted(&self, _item: &MemoryItem) {}

    /// An item was removed explicitly or by the decay sweep.
    fn on_deleted(&self, _id: MemoryId) {}
}

/// Handle returned by observer registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub(crate) u64);

/// Registered observer list owned by the coordinator.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<(ObserverHandle, Arc<dyn MemoryObserver>)>,
    next_handle: u64,
}

impl ObserverRegistry {
    pub fn register(&mut self, observer: Arc<dyn MemoryObserver>) -> ObserverHandle {
        let handle = ObserverHandle(self.next_handle);
        self.next_handle += 1;
        self.observers.push((handle, observer));
        handle
    }

    pub fn remove(&mut self, handle: ObserverHandle) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(h, _)| *h != handle);
        self.observers.len() != before
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn notify_stored(&self, item: &MemoryItem) {
        for (_, observer) in &self.observers {
            observer.on_stored(item);
        }
    }

    pub fn notify_promoted(&self, item: &MemoryItem) {
        for (_, observer) in &self.observers {
            observer.on_promoted(item);
        }
    }

    pub fn notify_evicted(&self, item: &MemoryItem) {
        for (_, observer) in &self.observers {
            observer.on_evicted(item);
        }
    }

    pub fn notify_deleted(&self, id: MemoryId) {
        for (_, observer) in &self.observers {
            observer.on_deleted(id);
        }
    }
}
