// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The trait for the durable record source.

use crate::{Kind, Query, Record};

/// The authoritative store behind the cache.
///
/// The versioned cache forwards writes to the source before it touches the
/// remote cache, and falls back to the source when neither cache level holds
/// a record. Sources report failures through their own error type; the cache
/// wraps them without inspecting them.
pub trait RecordSource: Send + Sync {
    /// The error reported by this source.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists a record, replacing any stored record with the same identity.
    ///
    /// Assigns an identity when the record has none and returns the stored
    /// record, including its identity.
    fn create(&self, record: Record) -> impl Future<Output = Result<Record, Self::Error>> + Send;

    /// Reads the first record of `kind` matching `query`.
    fn read(&self, kind: &Kind, query: &Query) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send;

    /// Removes the first record of `kind` matching `query`, returning it when it existed.
    fn delete(&self, kind: &Kind, query: &Query) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send;

    /// Lists every record of `kind` matching `query`.
    fn list(&self, kind: &Kind, query: &Query) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send;
}
