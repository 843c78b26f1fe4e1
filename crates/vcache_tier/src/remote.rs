// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The trait for shared remote cache backends.
//!
//! [`RemoteCache`] is the minimal key-value surface the versioned cache needs
//! from a shared, memcached-like store. Every process in a cluster points at
//! the same remote; version counters and versioned payloads both live there.

use std::time::Duration;

use bytes::Bytes;

use crate::Error;

/// Trait for shared remote cache implementations.
///
/// Implementations must be safe to call concurrently. `add` and `incr` must be
/// atomic with respect to other clients of the same remote: `add` is the only
/// create primitive the versioned cache relies on to resolve races, and `incr`
/// is the only way a version counter ever moves forward.
///
/// Counters are stored as ASCII decimal integers so that `incr` and `get`
/// observe the same representation.
pub trait RemoteCache: Send + Sync {
    /// Reads a value; `Ok(None)` when the key is absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Bytes>, Error>> + Send;

    /// Writes a value unconditionally, expiring after `ttl`.
    fn set(&self, key: &str, value: Bytes, ttl: Duration) -> impl Future<Output = Result<(), Error>> + Send;

    /// Writes a value only if the key is absent.
    ///
    /// Returns `true` when this call created the key and `false` when it
    /// already existed. Exactly one of several concurrent callers wins.
    fn add(&self, key: &str, value: Bytes, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Atomically increments an integer counter if it exists.
    ///
    /// Returns the new value, or `None` when the key is absent. Incrementing a
    /// value that is not an integer is an error.
    fn incr(&self, key: &str, delta: u64) -> impl Future<Output = Result<Option<i64>, Error>> + Send;

    /// Removes a key; removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;
}
