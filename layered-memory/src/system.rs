//! Memory coordinator
//!
//! Owns both tiers, the indices, and the observer list. Callers only talk to
//! [`MemorySystem`]: it decides which tier a new item lands in, merges query
//! results across tiers, and runs the periodic consolidation sweep.
//!
//! All public operations are synchronous and run to completion under a single
//! state lock, so no caller or sweep ever observes a half-updated index. The
//! cost is that latency is additive under heavy call volume; there is no
//! internal queuing.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::durable::{DurablePut, DurableTier};
use crate::error::Result;
use crate::events::{MemoryObserver, ObserverHandle, ObserverRegistry};
use crate::fast::FastTier;
use crate::index::MemoryIndex;
use crate::item::{MemoryId, MemoryItem, MemoryKind};
use crate::query::QuerySpec;

/// Configuration for [`MemorySystem`].
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    /// Fast tier capacity (default: 100).
    pub fast_capacity: usize,
    /// Durable tier capacity (default: 10,000).
    pub durable_capacity: usize,
    /// Admission gate of the durable tier (default: 0.3). Independent of the
    /// consolidation threshold.
    pub durable_importance_threshold: f64,
    /// Importance at which a store targets the durable tier directly and a
    /// fast-tier resident qualifies for consolidation (default: 0.7).
    pub consolidation_threshold: f64,
    /// Decay rate per day of inactivity (default: 0.1).
    pub decay_rate_per_day: f64,
    /// Period of the background consolidation sweep (default: 60s). A zero
    /// duration disables the scheduler entirely, which also makes
    /// construction possible outside a tokio runtime.
    pub consolidation_interval: Duration,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            fast_capacity: 100,
            durable_capacity: 10_000,
            durable_importance_threshold: 0.3,
            consolidation_threshold: 0.7,
            decay_rate_per_day: 0.1,
            consolidation_interval: Duration::from_secs(60),
        }
    }
}

/// Aggregate counts over both tiers. Pure read, no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total: usize,
    pub fast_count: usize,
    pub durable_count: usize,
    pub tag_count: usize,
    pub average_importance: f64,
    pub by_kind: HashMap<MemoryKind, usize>,
}

/// Two-tier memory store with automatic promotion, decay-based forgetting,
/// associative linking, and multi-index querying.
pub struct MemorySystem {
    inner: Arc<Mutex<Inner>>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

/// Coordinator state. Everything that any operation or sweep mutates lives
/// behind the one lock.
struct Inner {
    fast: FastTier,
    durable: DurableTier,
    index: MemoryIndex,
    observers: ObserverRegistry,
    options: MemoryOptions,
}

impl MemorySystem {
    /// Create a memory system and start its consolidation scheduler.
    ///
    /// Must be called within a tokio runtime unless
    /// `options.consolidation_interval` is zero.
    pub fn new(options: MemoryOptions) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            fast: FastTier::new(options.fast_capacity),
            durable: DurableTier::new(
                options.durable_capacity,
                options.durable_importance_threshold,
            ),
            index: MemoryIndex::new(),
            observers: ObserverRegistry::default(),
            options: options.clone(),
        }));

        let scheduler = if options.consolidation_interval.is_zero() {
            None
        } else {
            Some(Self::spawn_scheduler(
                Arc::downgrade(&inner),
                options.consolidation_interval,
            ))
        };

        log::info!(
            "memory system initialized (fast capacity {}, durable capacity {})",
            options.fast_capacity,
            options.durable_capacity
        );

        Self {
            inner,
            scheduler: Mutex::new(scheduler),
        }
    }

    /// Periodic consolidation task. Holds only a weak handle on the state so
    /// a dropped system cannot be kept alive by its own scheduler.
    fn spawn_scheduler(state: Weak<Mutex<Inner>>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick of an interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match state.upgrade() {
                    Some(inner) => inner.lock().consolidate(),
                    None => break,
                }
            }
        })
    }

    /// Store new content, returning its assigned id. Never fails: content
    /// that misses the durable tier's gate lands in the fast tier instead.
    pub fn store(
        &self,
        content: impl Into<serde_json::Value>,
        tags: Vec<String>,
        importance: f64,
        kind: MemoryKind,
    ) -> MemoryId {
        let item = MemoryItem::new(content.into(), tags, importance, kind);
        let id = item.id;
        self.inner.lock().place(item);
        id
    }

    /// Store any serializable value. Serialization is the only fallible step;
    /// placement follows the same rules as [`Self::store`].
    pub fn store_serializable<T: Serialize>(
        &self,
        content: &T,
        tags: Vec<String>,
        importance: f64,
        kind: MemoryKind,
    ) -> Result<MemoryId> {
        let value = serde_json::to_value(content)?;
        Ok(self.store(value, tags, importance, kind))
    }

    /// Look up an item by id, fast tier first. A hit updates access
    /// bookkeeping and recency.
    pub fn retrieve(&self, id: MemoryId) -> Option<MemoryItem> {
        self.inner.lock().retrieve(id)
    }

    /// Run a filtered query across both tiers. Results are materialized,
    /// deduplicated by id, sorted descending by the requested key, and
    /// truncated to the limit. Query reads do not count as accesses.
    pub fn query(&self, spec: &QuerySpec) -> Vec<MemoryItem> {
        self.inner.lock().query(spec)
    }

    /// Remove an item from whichever tier holds it and from all indices.
    pub fn delete(&self, id: MemoryId) -> bool {
        self.inner.lock().delete(id)
    }

    /// Symmetrically link two items. Returns false unless both currently
    /// resolve; re-linking already associated items is a no-op.
    pub fn associate(&self, a: MemoryId, b: MemoryId) -> bool {
        self.inner.lock().associate(a, b)
    }

    /// Resolve an item's associations. Ids that no longer resolve are
    /// silently dropped; they are stale references, not errors.
    pub fn associations(&self, id: MemoryId) -> Vec<MemoryItem> {
        self.inner.lock().associations(id)
    }

    /// Run a decay sweep over every resident item. Items whose decay falls
    /// below 0.01 are forgotten through the regular delete path.
    pub fn apply_decay(&self) {
        self.inner.lock().apply_decay();
    }

    /// Run a consolidation sweep: fast-tier items that are hot (more than 5
    /// accesses) or important enough move into the durable tier. Items below
    /// the durable gate stay where they are.
    pub fn consolidate(&self) {
        self.inner.lock().consolidate();
    }

    /// Aggregate counts over both tiers.
    pub fn stats(&self) -> MemoryStats {
        self.inner.lock().stats()
    }

    /// Remove every item and index entry. Observers stay registered.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Register a lifecycle observer. Callbacks run synchronously inside the
    /// operation that caused the event.
    pub fn register_observer(&self, observer: Arc<dyn MemoryObserver>) -> ObserverHandle {
        self.inner.lock().observers.register(observer)
    }

    /// Deregister an observer. Returns whether the handle was known.
    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        self.inner.lock().observers.remove(handle)
    }

    /// Stop the consolidation scheduler and drop all state. Idempotent.
    pub fn destroy(&self) {
        if let Some(handle) = self.scheduler.lock().take() {
            handle.abort();
        }
        let mut inner = self.inner.lock();
        inner.clear();
        inner.observers.clear();
        log::info!("memory system destroyed");
    }
}

impl Drop for MemorySystem {
    fn drop(&mut self) {
        if let Some(handle) = self.scheduler.lock().take() {
            handle.abort();
        }
    }
}

impl Inner {
    /// Place a new item per the placement rule: durable when its kind says so
    /// or its importance clears the consolidation threshold, fast otherwise.
    fn place(&mut self, item: MemoryItem) {
        let stored = item.clone();
        self.index.insert(&item);

        let durable_target = item.kind == MemoryKind::Durable
            || item.importance >= self.options.consolidation_threshold;

        let leftover = if durable_target {
            match self.durable.put(item) {
                DurablePut::Stored(evicted) => {
                    if let Some(victim) = evicted {
                        self.discard_evicted(victim);
                    }
                    None
                }
                // Below the tier's own gate: degraded to fast placement.
                DurablePut::Rejected(item) => Some(item),
            }
        } else {
            Some(item)
        };

        if let Some(item) = leftover {
            if let Some(victim) = self.fast.put(item) {
                self.handle_fast_eviction(victim);
            }
        }

        log::debug!(
            "memory stored: {} ({:?}, importance {:.2})",
            stored.id,
            stored.kind,
            stored.importance
        );
        self.observers.notify_stored(&stored);
    }

    /// A fast-tier eviction either promotes the victim into the durable tier
    /// or destroys it.
    fn handle_fast_eviction(&mut self, victim: MemoryItem) {
        self.observers.notify_evicted(&victim);

        if victim.importance >= self.options.consolidation_threshold {
            let promoted = victim.clone();
            match self.durable.put(victim) {
                DurablePut::Stored(evicted) => {
                    if let Some(displaced) = evicted {
                        self.discard_evicted(displaced);
                    }
                    self.observers.notify_promoted(&promoted);
                    return;
                }
                DurablePut::Rejected(victim) => {
                    self.index.remove(&victim);
                }
            }
        } else {
            self.index.remove(&victim);
        }
    }

    /// A durable-tier capacity eviction is always a destruction.
    fn discard_evicted(&mut self, victim: MemoryItem) {
        self.index.remove(&victim);
        self.observers.notify_evicted(&victim);
    }

    fn retrieve(&mut self, id: MemoryId) -> Option<MemoryItem> {
        if let Some(item) = self.fast.get(&id) {
            return Some(item.clone());
        }
        self.durable.get(&id).map(|item| item.clone())
    }

    fn query(&self, spec: &QuerySpec) -> Vec<MemoryItem> {
        let kind_ids =
            (!spec.kinds.is_empty()).then(|| self.index.ids_with_any_kind(&spec.kinds));
        let tag_ids = (!spec.tags.is_empty()).then(|| self.index.ids_with_any_tag(&spec.tags));

        // Candidate ids come from the indices; ids are unique across tiers so
        // no further deduplication is needed.
        let mut results: Vec<MemoryItem> = match (kind_ids, tag_ids) {
            (Some(kinds), Some(tags)) => kinds
                .intersection(&tags)
                .filter_map(|id| self.peek(id))
                .filter(|item| spec.matches(item))
                .cloned()
                .collect(),
            (Some(ids), None) | (None, Some(ids)) => ids
                .iter()
                .filter_map(|id| self.peek(id))
                .filter(|item| spec.matches(item))
                .cloned()
                .collect(),
            (None, None) => self
                .fast
                .iter()
                .chain(self.durable.iter())
                .filter(|item| spec.matches(item))
                .cloned()
                .collect(),
        };

        spec.sort(&mut results);
        if let Some(limit) = spec.limit {
            results.truncate(limit);
        }
        results
    }

    fn delete(&mut self, id: MemoryId) -> bool {
        let removed = self
            .fast
            .remove(&id)
            .or_else(|| self.durable.remove(&id));

        match removed {
            Some(item) => {
                self.index.remove(&item);
                self.observers.notify_deleted(id);
                log::debug!("memory deleted: {id}");
                true
            }
            None => false,
        }
    }

    fn associate(&mut self, a: MemoryId, b: MemoryId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if let Some(item) = self.peek_mut(a) {
            item.associations.insert(b);
        }
        if let Some(item) = self.peek_mut(b) {
            item.associations.insert(a);
        }
        true
    }

    fn associations(&mut self, id: MemoryId) -> Vec<MemoryItem> {
        let linked: Vec<MemoryId> = match self.peek(&id) {
            Some(item) => item.associations.iter().copied().collect(),
            None => return Vec::new(),
        };
        linked
            .into_iter()
            .filter_map(|assoc_id| self.retrieve(assoc_id))
            .collect()
    }

    /// Decay every resident item by inactivity, weighted so important items
    /// fade slower, and forget anything that drops below 0.01.
    fn apply_decay(&mut self) {
        let now = Utc::now();
        let rate = self.options.decay_rate_per_day;
        let mut forgotten = Vec::new();

        for item in self
            .fast
            .iter_mut()
            .chain(self.durable.iter_mut())
        {
            if item.decay <= 0.0 {
                continue;
            }
            let days_since_access =
                (now - item.last_accessed).num_milliseconds() as f64 / 86_400_000.0;
            let time_factor = (-rate * days_since_access).exp();
            item.decay =
                (item.decay * time_factor * (0.5 + item.importance * 0.5)).max(0.0);
            if item.decay < 0.01 {
                forgotten.push(item.id);
            }
        }

        for id in forgotten {
            self.delete(id);
        }
    }

    /// Move hot or important fast-tier items into the durable tier. Items
    /// that fail the durable gate remain in the fast tier untouched.
    fn consolidate(&mut self) {
        let threshold = self.options.consolidation_threshold;
        let candidates: Vec<MemoryItem> = self
            .fast
            .iter()
            .filter(|item| item.access_count > 5 || item.importance >= threshold)
            .cloned()
            .collect();

        for item in candidates {
            let id = item.id;
            match self.durable.put(item.clone()) {
                DurablePut::Stored(evicted) => {
                    self.fast.remove(&id);
                    if let Some(displaced) = evicted {
                        self.discard_evicted(displaced);
                    }
                    self.observers.notify_promoted(&item);
                    log::debug!("consolidated into durable tier: {id}");
                }
                DurablePut::Rejected(_) => {}
            }
        }
    }

    fn stats(&self) -> MemoryStats {
        let mut by_kind: HashMap<MemoryKind, usize> =
            MemoryKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut importance_sum = 0.0;
        let mut total = 0usize;

        for item in self.fast.iter().chain(self.durable.iter()) {
            *by_kind.entry(item.kind).or_insert(0) += 1;
            importance_sum += item.importance;
            total += 1;
        }

        MemoryStats {
            total,
            fast_count: self.fast.len(),
            durable_count: self.durable.len(),
            tag_count: self.index.tag_count(),
            average_importance: if total > 0 {
                importance_sum / total as f64
            } else {
                0.0
            },
            by_kind,
        }
    }

    fn clear(&mut self) {
        self.fast.clear();
        self.durable.clear();
        self.index.clear();
    }

    fn contains(&self, id: MemoryId) -> bool {
        self.fast.contains(&id) || self.durable.contains(&id)
    }

    fn peek(&self, id: &MemoryId) -> Option<&MemoryItem> {
        self.fast.peek(id).or_else(|| self.durable.peek(id))
    }

    fn peek_mut(&mut self, id: MemoryId) -> Option<&mut MemoryItem> {
        if self.fast.contains(&id) {
            return self.fast.peek_mut(&id);
        }
        self.durable.peek_mut(&id)
    }
}
