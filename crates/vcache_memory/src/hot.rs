// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hot cache implementation using moka.

use std::fmt;
use std::time::{Duration, SystemTime};

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tick::Clock;

use crate::builder::HotCacheBuilder;

#[derive(Clone)]
struct HotEntry<V> {
    value: V,
    cached_at: SystemTime,
}

/// A bounded in-process cache keyed by data key.
///
/// The cache evicts the least recently used entry once it holds more than
/// its configured number of entries, and optionally treats entries older than
/// a maximum age as absent. Entries are independent; the cache is safe to
/// share between concurrent operations and cheap to clone.
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use vcache_memory::HotCache;
/// # futures::executor::block_on(async {
///
/// let cache = HotCache::<i32>::builder(Clock::new_frozen()).max_entries(2).build();
///
/// cache.insert("a", 1).await;
/// cache.insert("b", 2).await;
/// assert_eq!(cache.get("a").await, Some(1));
///
/// // "b" is now the least recently used entry.
/// cache.insert("c", 3).await;
/// assert_eq!(cache.get("b").await, None);
/// assert_eq!(cache.entry_count(), 2);
/// # });
/// ```
#[derive(Clone)]
pub struct HotCache<V> {
    inner: Cache<String, HotEntry<V>>,
    clock: Clock,
    max_entries: u64,
    max_age: Option<Duration>,
}

impl<V> fmt::Debug for HotCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotCache")
            .field("name", &self.inner.name())
            .field("entry_count", &self.inner.entry_count())
            .field("max_entries", &self.max_entries)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl<V> HotCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache bounded to `max_entries` with no maximum age.
    #[must_use]
    pub fn new(clock: Clock, max_entries: u64) -> Self {
        Self::builder(clock).max_entries(max_entries).build()
    }

    /// Creates a new builder for configuring a hot cache.
    #[must_use]
    pub fn builder(clock: Clock) -> HotCacheBuilder<V> {
        HotCacheBuilder::new(clock)
    }

    pub(crate) fn from_builder(builder: HotCacheBuilder<V>) -> Self {
        let mut moka_builder = Cache::builder()
            .max_capacity(builder.max_entries)
            .eviction_policy(EvictionPolicy::lru());

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            clock: builder.clock,
            max_entries: builder.max_entries,
            max_age: builder.max_age,
        }
    }

    /// Returns the cached value for `key`.
    ///
    /// An entry older than the maximum age is dropped and reported absent.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entry = self.inner.get(key).await?;
        if self.is_expired(&entry) {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry.value)
    }

    /// Stores `value` under `key`, evicting the least recently used entry when full.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let entry = HotEntry {
            value,
            cached_at: self.clock.system_time(),
        };
        self.inner.insert(key.into(), entry).await;
        // Apply the capacity bound now rather than on moka's own schedule.
        self.inner.run_pending_tasks().await;
    }

    /// Drops the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Returns the number of entries held.
    ///
    /// The count reflects maintenance up to the last insert or
    /// [`HotCache::run_pending_tasks`] call.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Runs pending maintenance so that [`HotCache::entry_count`] is exact.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Returns the configured entry bound.
    #[must_use]
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Returns the configured maximum entry age.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    fn is_expired(&self, entry: &HotEntry<V>) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        // A clock that moved backwards past the insert time counts as expired.
        self.clock
            .system_time()
            .duration_since(entry.cached_at)
            .ok()
            .is_none_or(|age| age > max_age)
    }
}
