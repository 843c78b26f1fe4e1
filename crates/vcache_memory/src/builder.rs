// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring hot caches.
//!
//! This module provides a builder API for [`HotCache`] that abstracts the
//! underlying moka configuration, providing a stable API surface without
//! exposing moka's types.

use std::marker::PhantomData;
use std::time::Duration;

use tick::Clock;

use crate::hot::HotCache;

/// Entry bound used when no explicit bound is configured.
pub const DEFAULT_MAX_ENTRIES: u64 = 1111;

/// Builder for configuring a [`HotCache`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tick::Clock;
/// use vcache_memory::HotCache;
///
/// let cache = HotCache::<String>::builder(Clock::new_frozen())
///     .max_entries(500)
///     .max_age(Duration::from_secs(30))
///     .name("records")
///     .build();
///
/// assert_eq!(cache.max_entries(), 500);
/// assert_eq!(cache.max_age(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug)]
pub struct HotCacheBuilder<V> {
    pub(crate) clock: Clock,
    pub(crate) max_entries: u64,
    pub(crate) max_age: Option<Duration>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<V>,
}

impl<V> HotCacheBuilder<V> {
    /// Creates a new builder reading entry ages from `clock`.
    ///
    /// The default configuration holds [`DEFAULT_MAX_ENTRIES`] entries and
    /// never ages them out.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Inserting beyond the bound evicts the least recently used entry.
    #[must_use]
    pub fn max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the maximum age of an entry.
    ///
    /// An entry older than this is reported absent even while it is still
    /// held, so a process eventually rereads data that another process may
    /// have replaced in the shared tier.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the maximum age of an entry from an optional value.
    #[must_use]
    pub fn max_age_opt(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets a name for the cache, shown in debugging output of the underlying cache.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured [`HotCache`].
    #[must_use]
    pub fn build(self) -> HotCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        HotCache::from_builder(self)
    }
}
