// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Counters describing which branches the versioned cache took.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// A point-in-time copy of the versioned cache counters.
///
/// Counters only ever grow for the lifetime of one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct StatsSnapshot {
    /// Snapshots written to the caches, by saves and by read backfills.
    pub set: u64,
    /// Identity loads that consulted the version counter.
    pub get: u64,
    /// Writes that advanced an existing version counter.
    pub vinc: u64,
    /// Version counters created, by saves and by read backfills.
    pub vadd: u64,
    /// Loads that found no live version counter.
    pub vmiss: u64,
    /// Loads that found a live version counter.
    pub vhit: u64,
    /// Versioned loads served from the hot cache.
    pub hot_hit: u64,
    /// Versioned loads the remote cache served.
    pub net_hit: u64,
    /// Versioned loads the hot cache could not serve.
    pub hot_miss: u64,
    /// Versioned loads neither cache level could serve.
    pub net_miss: u64,
    /// Records marked as removed.
    pub drop: u64,
    /// Failed remote cache operations and undecodable cache values.
    pub cache_errs: u64,
    /// Entries currently held by the hot cache.
    pub hot_size: u64,
    /// When the cache instance was created.
    pub start: SystemTime,
    /// When this snapshot was taken.
    pub end: SystemTime,
}

/// Which counter an observation increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Set,
    Get,
    Vinc,
    Vadd,
    Vmiss,
    Vhit,
    HotHit,
    NetHit,
    HotMiss,
    NetMiss,
    Drop,
    CacheErr,
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
    set: AtomicU64,
    get: AtomicU64,
    vinc: AtomicU64,
    vadd: AtomicU64,
    vmiss: AtomicU64,
    vhit: AtomicU64,
    hot_hit: AtomicU64,
    net_hit: AtomicU64,
    hot_miss: AtomicU64,
    net_miss: AtomicU64,
    drop: AtomicU64,
    cache_errs: AtomicU64,
}

impl Stats {
    pub(crate) fn incr(&self, counter: Counter) {
        let cell = match counter {
            Counter::Set => &self.set,
            Counter::Get => &self.get,
            Counter::Vinc => &self.vinc,
            Counter::Vadd => &self.vadd,
            Counter::Vmiss => &self.vmiss,
            Counter::Vhit => &self.vhit,
            Counter::HotHit => &self.hot_hit,
            Counter::NetHit => &self.net_hit,
            Counter::HotMiss => &self.hot_miss,
            Counter::NetMiss => &self.net_miss,
            Counter::Drop => &self.drop,
            Counter::CacheErr => &self.cache_errs,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, hot_size: u64, start: SystemTime, end: SystemTime) -> StatsSnapshot {
        let read = |cell: &AtomicU64| cell.load(Ordering::Relaxed);
        StatsSnapshot {
            set: read(&self.set),
            get: read(&self.get),
            vinc: read(&self.vinc),
            vadd: read(&self.vadd),
            vmiss: read(&self.vmiss),
            vhit: read(&self.vhit),
            hot_hit: read(&self.hot_hit),
            net_hit: read(&self.net_hit),
            hot_miss: read(&self.hot_miss),
            net_miss: read(&self.net_miss),
            drop: read(&self.drop),
            cache_errs: read(&self.cache_errs),
            hot_size,
            start,
            end,
        }
    }
}
