// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test doubles for the versioned cache collaborators.
//!
//! This module provides [`MockRemote`], an in-memory [`RemoteCache`] that
//! records all operations, supports failure injection and lets tests stage
//! races and evictions, and [`MemorySource`], an in-memory [`RecordSource`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{Error, Kind, Query, Record, RecordId, RecordSource, RemoteCache};

/// Recorded remote cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// An unconditional write.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: Bytes,
        /// The requested time to live.
        ttl: Duration,
    },
    /// A create-if-absent write.
    Add {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: Bytes,
        /// The requested time to live.
        ttl: Duration,
    },
    /// An increment-if-present call.
    Incr {
        /// The counter key.
        key: String,
        /// The requested increment.
        delta: u64,
    },
    /// A delete operation was performed with the given key.
    Delete(String),
}

impl RemoteOp {
    /// Returns the key the operation targets.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Delete(key) => key,
            Self::Set { key, .. } | Self::Add { key, .. } | Self::Incr { key, .. } => key,
        }
    }
}

type RemotePredicate = Box<dyn Fn(&RemoteOp) -> bool + Send + Sync>;
type RemoteHook = Box<dyn Fn(&RemoteOp, &mut HashMap<String, Bytes>) + Send + Sync>;

/// A configurable in-memory remote cache for testing.
///
/// Values never expire on their own; use [`MockRemote::evict`] to simulate the
/// remote dropping an entry. All operations are recorded for later
/// verification, and clones share the same state.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use vcache_tier::RemoteCache;
/// use vcache_tier::testing::{MockRemote, RemoteOp};
///
/// # futures::executor::block_on(async {
/// let remote = MockRemote::new();
///
/// assert_eq!(remote.incr("n", 1).await.unwrap(), None);
/// assert!(remote.add("n", Bytes::from("0"), Duration::from_secs(60)).await.unwrap());
/// assert_eq!(remote.incr("n", 1).await.unwrap(), Some(1));
///
/// remote.fail_when(|op| matches!(op, RemoteOp::Get(_)));
/// assert!(remote.get("n").await.is_err());
/// # });
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
///
/// # Staging Races
///
/// [`MockRemote::before_apply`] runs a hook against the stored data right
/// before each operation takes effect, which lets a test play the part of a
/// concurrent client. The hook runs while the data lock is held and must not
/// call back into the mock.
#[derive(Clone, Default)]
pub struct MockRemote {
    data: Arc<Mutex<HashMap<String, Bytes>>>,
    operations: Arc<Mutex<Vec<RemoteOp>>>,
    fail_when: Arc<Mutex<Option<RemotePredicate>>>,
    before_apply: Arc<Mutex<Option<RemoteHook>>>,
}

impl std::fmt::Debug for MockRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemote")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("before_apply", &self.before_apply.lock().is_some())
            .finish()
    }
}

impl MockRemote {
    /// Creates a new empty mock remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// A failing operation is still recorded but leaves the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&RemoteOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Installs a hook that runs against the data before each operation applies.
    pub fn before_apply<F>(&self, hook: F)
    where
        F: Fn(&RemoteOp, &mut HashMap<String, Bytes>) + Send + Sync + 'static,
    {
        *self.before_apply.lock() = Some(Box::new(hook));
    }

    /// Removes the hook installed by [`MockRemote::before_apply`].
    pub fn clear_before_apply(&self) {
        *self.before_apply.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<RemoteOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Drops a key without recording an operation, as if the remote evicted it.
    pub fn evict(&self, key: &str) -> bool {
        self.data.lock().remove(key).is_some()
    }

    /// Returns the stored value for a key without recording an operation.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Bytes> {
        self.data.lock().get(key).cloned()
    }

    /// Returns the sorted list of stored keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns true if the remote holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Records the operation, applies failure injection and the hook, then runs `apply`.
    fn perform<T>(&self, op: RemoteOp, apply: impl FnOnce(&mut HashMap<String, Bytes>) -> Result<T, Error>) -> Result<T, Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        let mut data = self.data.lock();
        if let Some(hook) = self.before_apply.lock().as_ref() {
            hook(&op, &mut data);
        }
        let outcome = if fail {
            Err(Error::caused_by(format!("mock: {} failed", op_name(&op))))
        } else {
            apply(&mut data)
        };
        drop(data);
        self.operations.lock().push(op);
        outcome
    }
}

fn op_name(op: &RemoteOp) -> &'static str {
    match op {
        RemoteOp::Get(_) => "get",
        RemoteOp::Set { .. } => "set",
        RemoteOp::Add { .. } => "add",
        RemoteOp::Incr { .. } => "incr",
        RemoteOp::Delete(_) => "delete",
    }
}

fn parse_counter(value: &Bytes) -> Result<i64, Error> {
    std::str::from_utf8(value)
        .map_err(Error::from_message)?
        .parse::<i64>()
        .map_err(Error::from_message)
}

impl RemoteCache for MockRemote {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        self.perform(RemoteOp::Get(key.to_string()), |data| Ok(data.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Error> {
        let op = RemoteOp::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        };
        self.perform(op, |data| {
            data.insert(key.to_string(), value);
            Ok(())
        })
    }

    async fn add(&self, key: &str, value: Bytes, ttl: Duration) -> Result<bool, Error> {
        let op = RemoteOp::Add {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        };
        self.perform(op, |data| {
            if data.contains_key(key) {
                return Ok(false);
            }
            data.insert(key.to_string(), value);
            Ok(true)
        })
    }

    async fn incr(&self, key: &str, delta: u64) -> Result<Option<i64>, Error> {
        let op = RemoteOp::Incr {
            key: key.to_string(),
            delta,
        };
        self.perform(op, |data| {
            let Some(current) = data.get(key) else {
                return Ok(None);
            };
            let delta = i64::try_from(delta).map_err(Error::from_message)?;
            let next = parse_counter(current)?
                .checked_add(delta)
                .ok_or_else(|| Error::from_message("mock: counter overflow"))?;
            data.insert(key.to_string(), Bytes::from(next.to_string()));
            Ok(Some(next))
        })
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.perform(RemoteOp::Delete(key.to_string()), |data| {
            data.remove(key);
            Ok(())
        })
    }
}

/// Recorded record source operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOp {
    /// A record was written.
    Create(Record),
    /// A single record was read.
    Read(Kind, Query),
    /// A record was deleted.
    Delete(Kind, Query),
    /// Records were listed.
    List(Kind, Query),
}

type SourcePredicate = Box<dyn Fn(&SourceOp) -> bool + Send + Sync>;

/// An in-memory record source for testing.
///
/// Records without an identity are assigned `m1`, `m2`, and so on. Reads and
/// deletes match the first record in identity order. Clones share the same
/// state.
#[derive(Clone, Default)]
pub struct MemorySource {
    records: Arc<Mutex<BTreeMap<(Kind, RecordId), Record>>>,
    operations: Arc<Mutex<Vec<SourceOp>>>,
    fail_when: Arc<Mutex<Option<SourcePredicate>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("records", &self.records)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl MemorySource {
    /// Creates a new empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record directly, bypassing operation recording.
    ///
    /// Use this to change the authoritative data behind the cache's back.
    /// Records without an identity are ignored.
    pub fn put(&self, record: Record) {
        if let Some(id) = record.id().cloned() {
            self.records.lock().insert((record.kind().clone(), id), record);
        }
    }

    /// Returns a stored record without recording an operation.
    #[must_use]
    pub fn record(&self, kind: &Kind, id: &RecordId) -> Option<Record> {
        self.records.lock().get(&(kind.clone(), id.clone())).cloned()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Sets a predicate that determines when operations should fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&SourceOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<SourceOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: SourceOp) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            return Err(Error::caused_by("mock: source operation failed"));
        }
        Ok(())
    }

    fn first_match(&self, kind: &Kind, query: &Query) -> Option<(Kind, RecordId)> {
        self.records
            .lock()
            .iter()
            .find(|((record_kind, _), record)| record_kind == kind && query.matches(record))
            .map(|(key, _)| key.clone())
    }
}

impl RecordSource for MemorySource {
    type Error = Error;

    async fn create(&self, mut record: Record) -> Result<Record, Error> {
        self.check(SourceOp::Create(record.clone()))?;
        let id = match record.id() {
            Some(id) => id.clone(),
            None => {
                let id = RecordId::Text(format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1));
                record.set_id(id.clone());
                id
            }
        };
        self.records.lock().insert((record.kind().clone(), id), record.clone());
        Ok(record)
    }

    async fn read(&self, kind: &Kind, query: &Query) -> Result<Option<Record>, Error> {
        self.check(SourceOp::Read(kind.clone(), query.clone()))?;
        Ok(self.first_match(kind, query).and_then(|key| self.records.lock().get(&key).cloned()))
    }

    async fn delete(&self, kind: &Kind, query: &Query) -> Result<Option<Record>, Error> {
        self.check(SourceOp::Delete(kind.clone(), query.clone()))?;
        Ok(self.first_match(kind, query).and_then(|key| self.records.lock().remove(&key)))
    }

    async fn list(&self, kind: &Kind, query: &Query) -> Result<Vec<Record>, Error> {
        self.check(SourceOp::List(kind.clone(), query.clone()))?;
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|((record_kind, _), record)| record_kind == kind && query.matches(record))
            .map(|(_, record)| record.clone())
            .collect())
    }
}
