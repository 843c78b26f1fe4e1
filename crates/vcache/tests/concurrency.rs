// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrent writers and readers on a multi-threaded runtime.

use std::collections::BTreeSet;
use std::sync::Arc;

use tick::Clock;
use vcache::{Kind, Query, Record, RecordId, VersionState, VersionedCache};
use vcache_tier::testing::{MemorySource, MockRemote, RemoteOp};

const WRITERS: u64 = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_receive_distinct_versions() {
    let remote = MockRemote::new();
    let source = MemorySource::new();
    let cache = Arc::new(
        VersionedCache::builder(Clock::new_frozen())
            .prefix("t")
            .build(remote.clone(), source.clone()),
    );
    let kind = Kind::new("k");

    let tasks: Vec<_> = (0..WRITERS)
        .map(|n| {
            let cache = Arc::clone(&cache);
            let record = Record::new(kind.clone()).with_id("x").with_field("n", n);
            tokio::spawn(async move { cache.save(record).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("task").expect("save");
    }

    let data_keys: Vec<String> = remote
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            RemoteOp::Set { key, .. } if key.starts_with("t~d~") => Some(key),
            _ => None,
        })
        .collect();
    let distinct: BTreeSet<_> = data_keys.iter().cloned().collect();
    let expected: BTreeSet<_> = (0..WRITERS).map(|version| format!("t~d~{version}~k~x")).collect();

    assert_eq!(data_keys.len(), distinct.len(), "a data key was written twice: {data_keys:?}");
    assert_eq!(distinct, expected);
    assert_eq!(
        cache.current_version(&kind, &RecordId::from("x")).await.expect("version"),
        VersionState::Current(WRITERS - 1)
    );

    let stats = cache.stats().await;
    assert_eq!(stats.vadd, 1);
    assert_eq!(stats.vinc, WRITERS - 1);
    assert_eq!(stats.set, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_version_older_than_the_last_completed_save() {
    let remote = MockRemote::new();
    let source = MemorySource::new();
    let writer = VersionedCache::builder(Clock::new_frozen())
        .prefix("t")
        .build(remote.clone(), source.clone());
    let reader = Arc::new(
        VersionedCache::builder(Clock::new_frozen())
            .prefix("t")
            .build(remote.clone(), source.clone()),
    );
    let kind = Kind::new("k");

    for n in 0..20_u64 {
        writer
            .save(Record::new(kind.clone()).with_id("x").with_field("n", n))
            .await
            .expect("save");

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = Arc::clone(&reader);
                let kind = kind.clone();
                tokio::spawn(async move { reader.load(&kind, &Query::id("x")).await })
            })
            .collect();
        for task in readers {
            let loaded = task.await.expect("task").expect("load").expect("record");
            assert_eq!(loaded.field("n"), Some(&serde_json::json!(n)));
        }
    }
}
