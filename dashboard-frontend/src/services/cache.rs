//! Query cache shared by every list view and mutation.
//!
//! Entries are keyed by [`QueryKey`] and invalidated by key prefix.
//! Invalidation marks matching entries stale and broadcasts the prefix so
//! live fetchers can re-request straight away. Entries not written for
//! `gc_after` are evicted.

use crate::query::{ListFilters, QueryParams};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Ordered key segments, e.g. `documents/list/page=1&limit=20`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

pub mod keys {
    use super::*;

    pub const DOCUMENTS: &str = "documents";
    pub const JOBS: &str = "jobs";
    const LIST: &str = "list";
    const ITEM: &str = "item";

    pub fn root(resource: &str) -> QueryKey {
        QueryKey::new(resource)
    }

    /// Every list query of a resource, whatever its parameters.
    pub fn lists(resource: &str) -> QueryKey {
        QueryKey::new(resource).with(LIST)
    }

    pub fn list<F: ListFilters>(resource: &str, params: &QueryParams<F>) -> QueryKey {
        lists(resource).with(params.to_query_string())
    }

    pub fn item(resource: &str, id: &str) -> QueryKey {
        QueryKey::new(resource).with(ITEM).with(id)
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: bool,
}

const DEFAULT_GC_AFTER: Duration = Duration::from_secs(5 * 60);

pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    stale_after: Duration,
    gc_after: Duration,
    invalidations: broadcast::Sender<QueryKey>,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            entries: DashMap::new(),
            stale_after,
            gc_after: DEFAULT_GC_AFTER.max(stale_after),
            invalidations,
        }
    }

    /// Evict entries once they are this old. Never shorter than the
    /// freshness window.
    pub fn with_gc_after(mut self, gc_after: Duration) -> Self {
        self.gc_after = gc_after.max(self.stale_after);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached value if it is neither invalidated nor older than the
    /// freshness window.
    pub fn get_fresh<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.get_fresh_within(key, self.stale_after)
    }

    /// [`get_fresh`](Self::get_fresh) with a freshness window of the
    /// caller's choosing.
    pub fn get_fresh_within<T: Clone + 'static>(
        &self,
        key: &QueryKey,
        max_age: Duration,
    ) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.stale || entry.fetched_at.elapsed() >= max_age {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Cached value regardless of freshness.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.prune();
        self.entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                stale: false,
            },
        );
    }

    pub fn remove(&self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// Drop every entry older than the gc window. Returns how many went.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < self.gc_after);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired cache entries");
        }
        evicted
    }

    /// Mark every entry under `prefix` stale and notify subscribers.
    /// Returns the number of entries marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.value_mut().stale = true;
                marked += 1;
            }
        }

        tracing::debug!(prefix = %prefix, marked, "Invalidated cached queries");
        // No subscribers is fine: the stale flag covers the next read.
        let _ = self.invalidations.send(prefix.clone());
        marked
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }
}
