// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `HotCache`.

use std::time::Duration;

use tick::{Clock, ClockControl};
use vcache_memory::{DEFAULT_MAX_ENTRIES, HotCache, HotCacheBuilder};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn builder_defaults() {
    let cache = HotCacheBuilder::<i32>::new(Clock::new_frozen()).build();

    assert_eq!(cache.max_entries(), DEFAULT_MAX_ENTRIES);
    assert_eq!(cache.max_age(), None);
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn get_returns_none_for_missing_key() {
    block_on(async {
        let cache = HotCache::<i32>::new(Clock::new_frozen(), 10);
        assert_eq!(cache.get("missing").await, None);
    });
}

#[test]
fn insert_overwrites_existing_value() {
    block_on(async {
        let cache = HotCache::<i32>::new(Clock::new_frozen(), 10);
        cache.insert("key", 42).await;
        cache.insert("key", 100).await;

        assert_eq!(cache.get("key").await, Some(100));
        assert_eq!(cache.entry_count(), 1);
    });
}

#[test]
fn capacity_one_keeps_only_latest_insert() {
    block_on(async {
        let cache = HotCache::<&'static str>::new(Clock::new_frozen(), 1);
        cache.insert("first", "a").await;
        cache.insert("second", "b").await;

        assert_eq!(cache.get("first").await, None);
        assert_eq!(cache.get("second").await, Some("b"));
        assert_eq!(cache.entry_count(), 1);
    });
}

#[test]
fn eviction_picks_least_recently_used() {
    block_on(async {
        let cache = HotCache::<i32>::new(Clock::new_frozen(), 3);
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        cache.insert("c", 3).await;

        assert_eq!(cache.get("a").await, Some(1));
        cache.insert("d", 4).await;

        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("c").await, Some(3));
        assert_eq!(cache.get("d").await, Some(4));
    });
}

#[test]
fn invalidate_removes_entry() {
    block_on(async {
        let cache = HotCache::<i32>::new(Clock::new_frozen(), 10);
        cache.insert("key", 42).await;
        cache.invalidate("key").await;
        cache.invalidate("never-inserted").await;

        assert_eq!(cache.get("key").await, None);
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 0);
    });
}

#[test]
fn clone_shares_underlying_cache() {
    block_on(async {
        let cache = HotCache::<i32>::new(Clock::new_frozen(), 10);
        let clone = cache.clone();

        cache.insert("key", 7).await;
        assert_eq!(clone.get("key").await, Some(7));
    });
}

#[test]
fn max_age_hides_stale_entries() {
    block_on(async {
        let control = ClockControl::new();
        let cache = HotCacheBuilder::<i32>::new(control.to_clock())
            .max_age_opt(Some(Duration::from_millis(500)))
            .build();

        cache.insert("key", 1).await;
        control.advance(Duration::from_millis(501));

        assert_eq!(cache.get("key").await, None);
    });
}
