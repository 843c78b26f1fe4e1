// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for kind routing and source-only operations.

use serde_json::json;
use tick::Clock;
use vcache::{Error, Kind, Options, Query, Record, Routing, VersionedCache};
use vcache_tier::testing::{MemorySource, MockRemote, SourceOp};

type TestResult = Result<(), Error>;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn passthrough_kind_never_touches_remote() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let source = MemorySource::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .only_kinds(["product"])
            .build(remote.clone(), source.clone());
        let audit = Kind::new("audit");

        let saved = cache.save(Record::new(audit.clone()).with_id("e1").with_field("what", "login")).await?;
        assert_eq!(cache.load(&audit, &Query::id("e1")).await?, Some(saved.clone()));
        assert_eq!(cache.remove(&audit, &Query::id("e1")).await?, Some(saved));

        assert!(remote.operations().is_empty());
        let stats = cache.stats().await;
        assert_eq!(stats.set, 0);
        assert_eq!(stats.get, 0);
        assert_eq!(stats.drop, 0);
        Ok(())
    })
}

#[test]
fn listed_kind_is_cached() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .only_kinds(["product"])
            .build(remote.clone(), MemorySource::new());

        cache.save(Record::new(Kind::new("product")).with_id("p1")).await?;

        assert!(remote.contains_key("vcache~v~product~p1"));
        assert!(remote.contains_key("vcache~d~0~product~p1"));
        Ok(())
    })
}

#[test]
fn explicit_passthrough_overrides_cached_default() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .passthrough_kind("session")
            .build(remote.clone(), MemorySource::new());

        cache.save(Record::new(Kind::new("session")).with_id("s1")).await?;
        assert!(remote.operations().is_empty());

        cache.save(Record::new(Kind::new("user")).with_id("u1")).await?;
        assert!(remote.contains_key("vcache~v~user~u1"));
        Ok(())
    })
}

#[test]
fn default_routing_and_cache_kind_combine() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .default_routing(Routing::Passthrough)
            .cache_kind("user")
            .build(remote.clone(), MemorySource::new());

        cache.save(Record::new(Kind::new("order")).with_id("o1")).await?;
        assert!(remote.operations().is_empty());

        cache.save(Record::new(Kind::new("user")).with_id("u1")).await?;
        assert!(remote.contains_key("vcache~v~user~u1"));
        Ok(())
    })
}

#[test]
fn list_reads_only_the_source() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let source = MemorySource::new();
        let kind = Kind::new("product");
        source.put(Record::new(kind.clone()).with_id("p1").with_field("color", "red"));
        source.put(Record::new(kind.clone()).with_id("p2").with_field("color", "blue"));
        source.put(Record::new(kind.clone()).with_id("p3").with_field("color", "red"));
        let cache = VersionedCache::builder(Clock::new_frozen()).build(remote.clone(), source.clone());

        let query = Query::from_value(json!({ "color": "red" })).expect("query");
        let reds = cache.list(&kind, &query).await?;

        let ids: Vec<_> = reds.iter().filter_map(|record| record.id().map(ToString::to_string)).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert!(remote.operations().is_empty());
        assert_eq!(source.operations(), vec![SourceOp::List(kind, query)]);
        Ok(())
    })
}

#[test]
fn options_configure_prefix_and_hot_bound() -> TestResult {
    block_on(async {
        let options: Options = serde_json::from_value(json!({ "prefix": "shop", "max_hot": 1, "expires": 60 })).expect("options");
        let remote = MockRemote::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .options(options)
            .build(remote.clone(), MemorySource::new());
        let kind = Kind::new("product");

        cache.save(Record::new(kind.clone()).with_id("p1")).await?;
        cache.save(Record::new(kind.clone()).with_id("p2")).await?;

        assert!(remote.contains_key("shop~v~product~p1"));
        assert!(remote.contains_key("shop~d~0~product~p2"));
        assert_eq!(cache.stats().await.hot_size, 1);
        Ok(())
    })
}

#[test]
fn prefix_and_components_are_escaped() -> TestResult {
    block_on(async {
        let remote = MockRemote::new();
        let cache = VersionedCache::builder(Clock::new_frozen())
            .prefix("a~b")
            .build(remote.clone(), MemorySource::new());

        cache.save(Record::new(Kind::new("k~1")).with_id("x%y")).await?;

        assert!(remote.contains_key("a%7Eb~v~k%7E1~x%25y"));
        assert!(remote.contains_key("a%7Eb~d~0~k%7E1~x%25y"));
        Ok(())
    })
}
