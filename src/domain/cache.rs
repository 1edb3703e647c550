//! Per-indicator memoisation keyed by bar index.
//!
//! Each entry remembers the revision of the bar it was computed from. An entry
//! for a closed bar is permanent; an entry for the last bar stays valid only
//! while that bar keeps the same revision. A valid entry whose bar has since
//! been closed is promoted to permanent on its next lookup. A snapshot taken
//! before the final revision of a closed bar never sees that bar's permanent
//! entry; it computes against its own bars and leaves the entry in place.
//!
//! The store lock is held only for lookups and inserts, never while computing.
//! Two threads racing on the same index both compute and the last write wins,
//! except that a permanent entry is never overwritten.

use crate::domain::bar_series::SeriesSnapshot;
use crate::domain::error::{Result, SamtaError};
use crate::domain::num::Numeric;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

/// Memory policy for an indicator's cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStrategy {
    /// Keep every computed value for the lifetime of the indicator.
    #[default]
    Unbounded,
    /// Keep at most `capacity` values, evicting the least recently used.
    Recent { capacity: NonZeroUsize },
}

impl CacheStrategy {
    pub fn recent(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(|capacity| CacheStrategy::Recent { capacity })
            .ok_or_else(|| SamtaError::configuration("cache capacity must be positive"))
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Unbounded => write!(f, "unbounded"),
            CacheStrategy::Recent { capacity } => write!(f, "recent({capacity})"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    revision: u64,
    closed: bool,
}

/// Outcome of checking an entry against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Valid,
    /// The bar was replaced after the entry was computed.
    Stale,
    /// The entry is closed but the snapshot predates the bar's final revision.
    Ahead,
}

impl<T> CacheEntry<T> {
    /// Checks the entry against `snapshot`, promoting it to closed when its bar
    /// has been closed in the meantime.
    fn refresh<N: Numeric>(&mut self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Freshness {
        if snapshot.revision(index) != Some(self.revision) {
            return if self.closed {
                Freshness::Ahead
            } else {
                Freshness::Stale
            };
        }
        if !self.closed && snapshot.is_closed(index) {
            self.closed = true;
        }
        Freshness::Valid
    }
}

/// Least-recently-used store. `order` maps access tick to index.
struct RecentStore<T> {
    capacity: usize,
    entries: HashMap<usize, (CacheEntry<T>, u64)>,
    order: BTreeMap<u64, usize>,
    tick: u64,
}

impl<T> RecentStore<T> {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            entries: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, index: usize) {
        let tick = self.next_tick();
        if let Some((_, last_used)) = self.entries.get_mut(&index) {
            self.order.remove(&*last_used);
            *last_used = tick;
            self.order.insert(tick, index);
        }
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut CacheEntry<T>> {
        self.touch(index);
        self.entries.get_mut(&index).map(|(entry, _)| entry)
    }

    fn remove(&mut self, index: usize) {
        if let Some((_, last_used)) = self.entries.remove(&index) {
            self.order.remove(&last_used);
        }
    }

    fn insert(&mut self, index: usize, entry: CacheEntry<T>) {
        self.remove(index);
        while self.entries.len() >= self.capacity {
            match self.order.pop_first() {
                Some((_, evicted)) => {
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
        let tick = self.next_tick();
        self.entries.insert(index, (entry, tick));
        self.order.insert(tick, index);
    }

    fn indices_below(&self, index: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = self.entries.keys().copied().filter(|&k| k < index).collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices
    }
}

enum Store<T> {
    Unbounded(Vec<Option<CacheEntry<T>>>),
    Recent(RecentStore<T>),
}

impl<T> Store<T> {
    fn new(strategy: CacheStrategy) -> Self {
        match strategy {
            CacheStrategy::Unbounded => Store::Unbounded(Vec::new()),
            CacheStrategy::Recent { capacity } => Store::Recent(RecentStore::new(capacity)),
        }
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut CacheEntry<T>> {
        match self {
            Store::Unbounded(entries) => entries.get_mut(index).and_then(Option::as_mut),
            Store::Recent(recent) => recent.get_mut(index),
        }
    }

    fn remove(&mut self, index: usize) {
        match self {
            Store::Unbounded(entries) => {
                if let Some(slot) = entries.get_mut(index) {
                    *slot = None;
                }
            }
            Store::Recent(recent) => recent.remove(index),
        }
    }

    fn insert(&mut self, index: usize, entry: CacheEntry<T>) {
        match self {
            Store::Unbounded(entries) => {
                if index >= entries.len() {
                    entries.resize_with(index + 1, || None);
                }
                entries[index] = Some(entry);
            }
            Store::Recent(recent) => recent.insert(index, entry),
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::Unbounded(entries) => entries.iter().filter(|e| e.is_some()).count(),
            Store::Recent(recent) => recent.entries.len(),
        }
    }

    fn candidates_below(&self, index: usize) -> Vec<usize> {
        match self {
            Store::Unbounded(entries) => (0..index.min(entries.len()))
                .rev()
                .filter(|&k| entries[k].is_some())
                .collect(),
            Store::Recent(recent) => recent.indices_below(index),
        }
    }
}

pub struct IndicatorCache<T> {
    strategy: CacheStrategy,
    store: Mutex<Store<T>>,
}

impl<T: Clone> IndicatorCache<T> {
    pub fn new(strategy: CacheStrategy) -> Self {
        Self {
            strategy,
            store: Mutex::new(Store::new(strategy)),
        }
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    /// Number of stored entries, valid or not.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.store.lock() = Store::new(self.strategy);
    }

    /// Returns the valid cached value at `index`, or computes and stores it.
    pub fn get_or_compute<N, F>(
        &self,
        snapshot: &SeriesSnapshot<'_, N>,
        index: usize,
        compute: F,
    ) -> Result<T>
    where
        N: Numeric,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.lookup(snapshot, index) {
            return Ok(value);
        }
        trace!(index, "cache miss");
        let value = compute()?;
        self.store_value(snapshot, index, value.clone());
        Ok(value)
    }

    /// Evaluates a recurrence up to `index` iteratively.
    ///
    /// Starts from the nearest valid cached value below `index` (or from index 0
    /// when there is none) and calls `step(i, previous)` for each index up to
    /// and including `index`, storing every result.
    pub fn fill_forward<N, F>(
        &self,
        snapshot: &SeriesSnapshot<'_, N>,
        index: usize,
        mut step: F,
    ) -> Result<T>
    where
        N: Numeric,
        F: FnMut(usize, Option<&T>) -> Result<T>,
    {
        if let Some(value) = self.lookup(snapshot, index) {
            return Ok(value);
        }
        let (start, mut previous) = match self.latest_before(snapshot, index) {
            Some((k, value)) => (k + 1, Some(value)),
            None => (0, None),
        };
        trace!(from = start, to = index, "filling recurrence");
        for i in start..=index {
            let value = step(i, previous.as_ref())?;
            self.store_value(snapshot, i, value.clone());
            previous = Some(value);
        }
        previous.ok_or(SamtaError::OutOfBounds {
            index,
            length: snapshot.len(),
        })
    }

    fn lookup<N: Numeric>(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Option<T> {
        let mut store = self.store.lock();
        let entry = store.get_mut(index)?;
        match entry.refresh(snapshot, index) {
            Freshness::Valid => Some(entry.value.clone()),
            Freshness::Ahead => {
                trace!(index, "snapshot older than closed entry");
                None
            }
            Freshness::Stale => {
                debug!(index, revision = entry.revision, "discarding stale cache entry");
                store.remove(index);
                None
            }
        }
    }

    fn latest_before<N: Numeric>(
        &self,
        snapshot: &SeriesSnapshot<'_, N>,
        index: usize,
    ) -> Option<(usize, T)> {
        let mut store = self.store.lock();
        for k in store.candidates_below(index) {
            let Some(entry) = store.get_mut(k) else {
                continue;
            };
            match entry.refresh(snapshot, k) {
                Freshness::Valid => return Some((k, entry.value.clone())),
                Freshness::Ahead => continue,
                Freshness::Stale => {
                    debug!(index = k, revision = entry.revision, "discarding stale cache entry");
                    store.remove(k);
                }
            }
        }
        None
    }

    fn store_value<N: Numeric>(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize, value: T) {
        let Some(revision) = snapshot.revision(index) else {
            return;
        };
        let closed = snapshot.is_closed(index);
        let mut store = self.store.lock();
        if store.get_mut(index).is_some_and(|existing| existing.closed) {
            return;
        }
        store.insert(
            index,
            CacheEntry {
                value,
                revision,
                closed,
            },
        );
    }
}

impl<T> fmt::Debug for IndicatorCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorCache")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
