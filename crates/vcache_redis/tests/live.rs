// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests against a live Redis server named by `VCACHE_REDIS_URL`.
//!
//! Without the variable every test returns immediately.

use std::time::Duration;

use bytes::Bytes;
use vcache_redis::RedisRemote;
use vcache_tier::RemoteCache;

const TTL: Duration = Duration::from_secs(30);

async fn remote() -> Option<RedisRemote> {
    let url = std::env::var("VCACHE_REDIS_URL").ok()?;
    Some(RedisRemote::connect(&url).await.expect("connect to redis"))
}

fn unique_key(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("vcache-test~{name}~{nanos}")
}

#[tokio::test]
async fn counter_primitives_follow_versioning_semantics() {
    let Some(remote) = remote().await else {
        return;
    };
    let key = unique_key("counter");

    assert_eq!(remote.incr(&key, 1).await.expect("incr"), None);
    assert_eq!(remote.get(&key).await.expect("get"), None);

    assert!(remote.add(&key, Bytes::from("0"), TTL).await.expect("add"));
    assert!(!remote.add(&key, Bytes::from("9"), TTL).await.expect("add again"));
    assert_eq!(remote.incr(&key, 1).await.expect("incr"), Some(1));
    assert_eq!(remote.incr(&key, 1).await.expect("incr"), Some(2));

    remote.set(&key, Bytes::from("-1"), TTL).await.expect("tombstone");
    assert_eq!(remote.incr(&key, 1).await.expect("incr tombstone"), Some(0));

    remote.delete(&key).await.expect("delete");
}

#[tokio::test]
async fn values_round_trip() {
    let Some(remote) = remote().await else {
        return;
    };
    let key = unique_key("value");

    remote.set(&key, Bytes::from_static(b"{\"a\":1}"), TTL).await.expect("set");
    assert_eq!(remote.get(&key).await.expect("get"), Some(Bytes::from_static(b"{\"a\":1}")));

    remote.delete(&key).await.expect("delete");
    assert_eq!(remote.get(&key).await.expect("get"), None);
}
