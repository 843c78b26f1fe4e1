// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-aside coordinator: save, load and remove over two cache tiers.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tick::Clock;
use vcache_memory::HotCache;
use vcache_tier::{Kind, Query, Record, RecordId, RecordSource, RemoteCache};

use crate::builder::{Routing, RoutingTable, VersionedCacheBuilder};
use crate::codec::{decode_record, encode_record};
use crate::stats::{Counter, Stats};
use crate::telemetry::{Event, Telemetry};
use crate::{Error, INITIAL_VERSION, KeyScheme, Result, StatsSnapshot, VersionState, VersionStore};

/// A versioned cache-aside layer in front of a record source.
///
/// Every cached record has a version counter in the shared remote cache and
/// one immutable snapshot per version, stored in both the remote cache and
/// an in-process hot cache. Writes go to the record source first and then
/// publish a new version; reads look up the current version and fetch the
/// snapshot written for exactly that version. A reader therefore never
/// observes data older than the latest completed write, and writers never
/// need to invalidate other processes' hot caches.
///
/// Only identity-shaped queries are answered from the caches. Any other
/// query, and every operation on a kind routed as [`Routing::Passthrough`],
/// goes straight to the record source.
///
/// # Errors
///
/// Operations fail with an [`Error`] naming the failed [`Layer`](crate::Layer).
/// Source failures abort before any cache is touched. Remote cache failures
/// are reported even when the record source step already succeeded; the
/// caches then heal on the next read's version check.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// use tick::Clock;
/// use vcache::VersionedCache;
/// use vcache_tier::testing::{MemorySource, MockRemote};
/// use vcache_tier::{Kind, Query, Record};
/// # futures::executor::block_on(async {
///
/// let cache = VersionedCache::builder(Clock::new_frozen()).build(MockRemote::new(), MemorySource::new());
/// let product = Kind::new("product");
///
/// let saved = cache
///     .save(Record::new(product.clone()).with_id("p1").with_field("price", 10))
///     .await
///     .unwrap();
/// let loaded = cache.load(&product, &Query::id("p1")).await.unwrap();
///
/// assert_eq!(loaded, Some(saved));
/// assert_eq!(cache.stats().await.hot_hit, 1);
/// # });
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
pub struct VersionedCache<R, S> {
    pub(crate) remote: Arc<R>,
    pub(crate) source: S,
    pub(crate) versions: VersionStore<R>,
    pub(crate) keys: KeyScheme,
    pub(crate) hot: HotCache<Record>,
    pub(crate) expires: Duration,
    pub(crate) routing: RoutingTable,
    pub(crate) stats: Stats,
    pub(crate) telemetry: Telemetry,
    pub(crate) clock: Clock,
    pub(crate) start: SystemTime,
}

impl<R, S> fmt::Debug for VersionedCache<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedCache")
            .field("keys", &self.keys)
            .field("hot", &self.hot)
            .field("expires", &self.expires)
            .field("routing", &self.routing)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl VersionedCache<(), ()> {
    /// Creates a builder reading time from `clock`.
    ///
    /// Production code passes `Clock::new_tokio()`; tests pass a controlled clock.
    #[must_use]
    pub fn builder(clock: Clock) -> VersionedCacheBuilder {
        VersionedCacheBuilder::new(clock)
    }
}

impl<R, S> VersionedCache<R, S>
where
    R: RemoteCache,
    S: RecordSource,
{
    /// Persists a record and publishes it as the record's next version.
    ///
    /// The record source assigns the identity; the saved record is cached
    /// under a freshly allocated version in both cache tiers and returned.
    /// A saved record without an identity cannot be cached and is returned
    /// as-is.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Source`](crate::Layer::Source) error when the
    /// record source rejects the write; nothing is cached then. Returns a
    /// [`Layer::Remote`](crate::Layer::Remote) error when the new version
    /// could not be published, in which case the record is already saved.
    pub async fn save(&self, record: Record) -> Result<Record> {
        let saved = self.source.create(record).await.map_err(Error::from_source)?;
        let kind = saved.kind().clone();

        if self.routing.route(&kind) == Routing::Passthrough {
            self.telemetry.record(&kind, "", Event::Bypassed);
            return Ok(saved);
        }

        let Some(id) = saved.id().cloned() else {
            self.telemetry.record(&kind, "", Event::Uncached);
            return Ok(saved);
        };

        let version_key = self.keys.version_key(&kind, &id);
        let next = self
            .versions
            .next_version(&kind, &id)
            .await
            .map_err(|e| self.cache_failure(&kind, &version_key, e))?;

        if next.created {
            self.stats.incr(Counter::Vadd);
            self.telemetry.record(&kind, &version_key, Event::VersionCreated);
        } else {
            self.stats.incr(Counter::Vinc);
            self.telemetry.record(&kind, &version_key, Event::VersionIncremented);
        }

        self.write_data(&kind, &id, next.version, &saved).await?;
        Ok(saved)
    }

    /// Loads the record matching `query`.
    ///
    /// Identity-shaped queries consult the record's current version and
    /// return the snapshot written for it, from the hot cache or the remote
    /// cache. When no version is live, the record is read from the source
    /// and cached at the initial version. When the snapshot for the live
    /// version is gone from both tiers, the record is reread from the source
    /// and written back under the same version.
    ///
    /// # Errors
    ///
    /// Returns an error when the record source or the remote cache fails, or
    /// when a cached value cannot be decoded. Cache failures never fall back
    /// to the record source.
    pub async fn load(&self, kind: &Kind, query: &Query) -> Result<Option<Record>> {
        let Some(id) = self.cached_identity(kind, query) else {
            self.telemetry.record(kind, "", Event::Bypassed);
            return self.source.read(kind, query).await.map_err(Error::from_source);
        };

        let version_key = self.keys.version_key(kind, &id);
        self.stats.incr(Counter::Get);
        let state = self
            .versions
            .current_version(kind, &id)
            .await
            .map_err(|e| self.cache_failure(kind, &version_key, e))?;

        match state {
            VersionState::Current(version) => {
                self.stats.incr(Counter::Vhit);
                self.telemetry.record(kind, &version_key, Event::VersionHit);
                self.load_current(kind, query, &id, version).await
            }
            VersionState::Absent | VersionState::Tombstoned => {
                self.stats.incr(Counter::Vmiss);
                self.telemetry.record(kind, &version_key, Event::VersionMiss);
                self.load_uncached(kind, query, &id, &version_key).await
            }
        }
    }

    /// Removes the record matching `query` and returns what the source removed.
    ///
    /// For identity-shaped queries the record's version counter is replaced
    /// by a tombstone, so no reader can be served a snapshot of the removed
    /// record afterwards. A later save of the same identity starts a new
    /// version history.
    ///
    /// The new history starts again at version 0. Hot caches of other
    /// processes may still hold the removed record's version 0 snapshot and
    /// serve it until the hot cache maximum age elapses, so an unbounded
    /// [`Options::hot_max_age`](crate::Options::hot_max_age) should not be
    /// combined with re-creating removed ids.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Source`](crate::Layer::Source) error when the
    /// record source rejects the delete, and a
    /// [`Layer::Remote`](crate::Layer::Remote) error when the tombstone could
    /// not be written after the delete succeeded.
    pub async fn remove(&self, kind: &Kind, query: &Query) -> Result<Option<Record>> {
        let removed = self.source.delete(kind, query).await.map_err(Error::from_source)?;

        let Some(id) = self.cached_identity(kind, query) else {
            self.telemetry.record(kind, "", Event::Bypassed);
            return Ok(removed);
        };

        let version_key = self.keys.version_key(kind, &id);
        self.versions
            .tombstone(kind, &id)
            .await
            .map_err(|e| self.cache_failure(kind, &version_key, e))?;

        self.stats.incr(Counter::Drop);
        self.telemetry.record(kind, &version_key, Event::Dropped);
        Ok(removed)
    }

    /// Lists the records matching `query`, straight from the record source.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Source`](crate::Layer::Source) error when the source fails.
    pub async fn list(&self, kind: &Kind, query: &Query) -> Result<Vec<Record>> {
        self.telemetry.record(kind, "", Event::Bypassed);
        self.source.list(kind, query).await.map_err(Error::from_source)
    }

    /// Reads the snapshot stored for one specific version of a record.
    ///
    /// The hot cache is consulted first, then the remote cache. The record
    /// source is never read and nothing is written back to the remote cache.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote cache fails or the snapshot cannot be decoded.
    pub async fn load_version(&self, kind: &Kind, id: &RecordId, version: u64) -> Result<Option<Record>> {
        let data_key = self.keys.data_key(kind, id, version);
        if let Some(record) = self.hot.get(&data_key).await {
            return Ok(Some(record));
        }

        let Some(record) = self.fetch_remote(kind, &data_key).await? else {
            return Ok(None);
        };
        self.hot.insert(data_key, record.clone()).await;
        Ok(Some(record))
    }

    /// Returns the state of a record's version counter.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote cache fails or holds an invalid counter.
    pub async fn current_version(&self, kind: &Kind, id: &RecordId) -> Result<VersionState> {
        self.versions
            .current_version(kind, id)
            .await
            .map_err(|e| self.cache_failure(kind, &self.keys.version_key(kind, id), e))
    }

    /// Returns a snapshot of the counters and the hot cache size.
    pub async fn stats(&self) -> StatsSnapshot {
        self.hot.run_pending_tasks().await;
        self.stats.snapshot(self.hot.entry_count(), self.start, self.clock.system_time())
    }

    /// Returns the scheme the cache derives its remote keys with.
    #[must_use]
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    /// Returns the record source the cache reads and writes through.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn cached_identity(&self, kind: &Kind, query: &Query) -> Option<RecordId> {
        match self.routing.route(kind) {
            Routing::Cached => query.identity(),
            Routing::Passthrough => None,
        }
    }

    async fn load_current(&self, kind: &Kind, query: &Query, id: &RecordId, version: u64) -> Result<Option<Record>> {
        let data_key = self.keys.data_key(kind, id, version);

        if let Some(record) = self.hot.get(&data_key).await {
            self.stats.incr(Counter::HotHit);
            self.telemetry.record(kind, &data_key, Event::HotHit);
            return Ok(Some(record));
        }
        self.stats.incr(Counter::HotMiss);
        self.telemetry.record(kind, &data_key, Event::HotMiss);

        if let Some(record) = self.fetch_remote(kind, &data_key).await? {
            self.hot.insert(data_key.clone(), record.clone()).await;
            self.stats.incr(Counter::NetHit);
            self.telemetry.record(kind, &data_key, Event::NetHit);
            return Ok(Some(record));
        }
        self.stats.incr(Counter::NetMiss);
        self.telemetry.record(kind, &data_key, Event::NetMiss);

        // The version is live but its snapshot was evicted from both tiers.
        let Some(record) = self.source.read(kind, query).await.map_err(Error::from_source)? else {
            return Ok(None);
        };
        self.write_data(kind, id, version, &record).await?;
        self.telemetry.record(kind, &data_key, Event::Backfilled);
        Ok(Some(record))
    }

    async fn load_uncached(&self, kind: &Kind, query: &Query, id: &RecordId, version_key: &str) -> Result<Option<Record>> {
        let Some(record) = self.source.read(kind, query).await.map_err(Error::from_source)? else {
            return Ok(None);
        };

        // Only the reader that creates the counter may publish the initial
        // snapshot; otherwise a concurrent save or a tombstone owns the key.
        let created = self
            .versions
            .create(kind, id)
            .await
            .map_err(|e| self.cache_failure(kind, version_key, e))?;
        if created {
            self.stats.incr(Counter::Vadd);
            self.telemetry.record(kind, version_key, Event::VersionCreated);
            self.write_data(kind, id, INITIAL_VERSION, &record).await?;
            self.telemetry.record(kind, version_key, Event::Backfilled);
        }

        Ok(Some(record))
    }

    async fn fetch_remote(&self, kind: &Kind, data_key: &str) -> Result<Option<Record>> {
        let payload = self
            .remote
            .get(data_key)
            .await
            .map_err(|e| self.cache_failure(kind, data_key, Error::from_remote(e)))?;

        payload
            .map(|payload| decode_record(kind, &payload))
            .transpose()
            .map_err(|e| self.cache_failure(kind, data_key, e))
    }

    async fn write_data(&self, kind: &Kind, id: &RecordId, version: u64, record: &Record) -> Result<()> {
        let data_key = self.keys.data_key(kind, id, version);
        let payload = encode_record(record).map_err(|e| self.cache_failure(kind, &data_key, e))?;

        self.remote
            .set(&data_key, payload, self.expires)
            .await
            .map_err(|e| self.cache_failure(kind, &data_key, Error::from_remote(e)))?;
        self.hot.insert(data_key, record.clone()).await;
        self.stats.incr(Counter::Set);
        Ok(())
    }

    fn cache_failure(&self, kind: &Kind, key: &str, error: Error) -> Error {
        self.stats.incr(Counter::CacheErr);
        self.telemetry.record(kind, key, Event::Error);
        error
    }
}
