// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-record version counters kept in the remote cache.

use std::sync::Arc;
use std::time::Duration;

use vcache_tier::{Kind, RecordId, RemoteCache};

use crate::codec::{decode_counter, encode_counter};
use crate::{Error, KeyScheme, Result};

/// The first version of a record history.
pub const INITIAL_VERSION: u64 = 0;

/// Counter value marking a removed record.
pub const TOMBSTONE: i64 = -1;

/// Counter value stored when a history starts.
const INITIAL_COUNTER: i64 = 0;

/// Rounds of increment then create attempted before giving up.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// The version assigned to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextVersion {
    /// The version the write must be stored under.
    pub version: u64,
    /// `true` when the write started a new version history.
    pub created: bool,
}

/// The state of a record's version counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
    /// No counter exists: never written, or evicted from the remote cache.
    Absent,
    /// The record was removed.
    Tombstoned,
    /// The current version.
    Current(u64),
}

/// Produces monotonic per-record versions from the remote cache's atomic primitives.
///
/// The store holds no locks of its own. Correctness rests on the remote's
/// `incr` and `add` being atomic: every version is the result of exactly one
/// successful increment or create, so no two writers ever receive the same
/// version for the same record.
#[derive(Debug)]
pub struct VersionStore<R> {
    remote: Arc<R>,
    keys: KeyScheme,
    expires: Duration,
}

impl<R> Clone for VersionStore<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            keys: self.keys.clone(),
            expires: self.expires,
        }
    }
}

impl<R: RemoteCache> VersionStore<R> {
    /// Creates a version store whose counters expire after `expires`.
    pub fn new(remote: Arc<R>, keys: KeyScheme, expires: Duration) -> Self {
        Self { remote, keys, expires }
    }

    /// Returns the version the next write of a record must use.
    ///
    /// Increments the counter; when it does not exist yet, creates it at
    /// [`INITIAL_VERSION`]. A writer that loses the create to a concurrent
    /// writer increments again instead of assuming the initial version.
    /// Incrementing a tombstone yields [`INITIAL_VERSION`], which also starts a
    /// new history.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Remote`](crate::Layer::Remote) error when the remote
    /// fails, holds a counter below the tombstone, or keeps evicting the
    /// counter between attempts.
    pub async fn next_version(&self, kind: &Kind, id: &RecordId) -> Result<NextVersion> {
        let key = self.keys.version_key(kind, id);

        for _ in 0..MAX_CREATE_ATTEMPTS {
            if let Some(counter) = self.remote.incr(&key, 1).await.map_err(Error::from_remote)? {
                let version = u64::try_from(counter)
                    .map_err(|e| Error::from_remote(format!("version counter {key} holds {counter}: {e}")))?;
                return Ok(NextVersion {
                    version,
                    created: version == INITIAL_VERSION,
                });
            }

            let created = self
                .remote
                .add(&key, encode_counter(INITIAL_COUNTER), self.expires)
                .await
                .map_err(Error::from_remote)?;
            if created {
                return Ok(NextVersion {
                    version: INITIAL_VERSION,
                    created: true,
                });
            }
        }

        Err(Error::from_remote(format!(
            "version counter {key} could not be created or incremented after {MAX_CREATE_ATTEMPTS} attempts"
        )))
    }

    /// Reads the state of a record's version counter.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Remote`](crate::Layer::Remote) error when the remote
    /// fails and a [`Layer::Codec`](crate::Layer::Codec) error when the counter
    /// is not a valid version.
    pub async fn current_version(&self, kind: &Kind, id: &RecordId) -> Result<VersionState> {
        let key = self.keys.version_key(kind, id);
        let Some(payload) = self.remote.get(&key).await.map_err(Error::from_remote)? else {
            return Ok(VersionState::Absent);
        };

        match decode_counter(&payload)? {
            TOMBSTONE => Ok(VersionState::Tombstoned),
            counter => u64::try_from(counter)
                .map(VersionState::Current)
                .map_err(|e| Error::from_codec(format!("version counter {key} holds {counter}: {e}"))),
        }
    }

    /// Creates a record's counter at [`INITIAL_VERSION`] if it does not exist.
    ///
    /// Returns `true` when this call created it.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Remote`](crate::Layer::Remote) error when the remote fails.
    pub async fn create(&self, kind: &Kind, id: &RecordId) -> Result<bool> {
        let key = self.keys.version_key(kind, id);
        self.remote
            .add(&key, encode_counter(INITIAL_COUNTER), self.expires)
            .await
            .map_err(Error::from_remote)
    }

    /// Marks a record as removed.
    ///
    /// # Errors
    ///
    /// Returns a [`Layer::Remote`](crate::Layer::Remote) error when the remote fails.
    pub async fn tombstone(&self, kind: &Kind, id: &RecordId) -> Result<()> {
        let key = self.keys.version_key(kind, id);
        self.remote
            .set(&key, encode_counter(TOMBSTONE), self.expires)
            .await
            .map_err(Error::from_remote)
    }

    /// Returns the key scheme counters are stored under.
    #[must_use]
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }
}
