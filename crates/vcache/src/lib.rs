// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A versioned cache-aside consistency layer.
//!
//! [`VersionedCache`] sits between application code and a durable
//! [`RecordSource`], serving reads from an in-process hot cache and a shared
//! [`RemoteCache`] while guaranteeing that no reader observes data older
//! than the most recent write. It needs no locks, invalidation broadcasts or
//! distributed transactions; the only primitive it relies on is the remote
//! cache's atomic increment.
//!
//! # How It Works
//!
//! Each record identity, a [`Kind`] and a [`RecordId`], owns two kinds of
//! remote keys, derived by [`KeyScheme`]:
//!
//! - a **version key** holding the record's current version number, or a
//!   tombstone once the record was removed;
//! - one **data key** per version, holding the immutable snapshot written for
//!   that version.
//!
//! A save writes to the record source, atomically allocates the next version
//! through [`VersionStore`] and stores the snapshot under the new data key.
//! A load reads the version key and then fetches exactly that version's
//! snapshot, from the hot cache if present. Because data keys never change
//! once written, hot caches in other processes never hold wrong data for a
//! version; they simply stop being asked for old versions.
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "test-util")]
//! # fn main() {
//! use tick::Clock;
//! use vcache::{VersionState, VersionedCache};
//! use vcache_tier::testing::{MemorySource, MockRemote};
//! use vcache_tier::{Kind, Query, Record, RecordId};
//! # futures::executor::block_on(async {
//!
//! let cache = VersionedCache::builder(Clock::new_frozen())
//!     .prefix("shop")
//!     .build(MockRemote::new(), MemorySource::new());
//! let order = Kind::new("order");
//!
//! cache.save(Record::new(order.clone()).with_id(7_u64).with_field("state", "open")).await.unwrap();
//! cache.save(Record::new(order.clone()).with_id(7_u64).with_field("state", "paid")).await.unwrap();
//!
//! let loaded = cache.load(&order, &Query::id(7_u64)).await.unwrap().unwrap();
//! assert_eq!(loaded.field("state"), Some(&serde_json::json!("paid")));
//! assert_eq!(cache.current_version(&order, &RecordId::from(7_u64)).await.unwrap(), VersionState::Current(1));
//!
//! cache.remove(&order, &Query::id(7_u64)).await.unwrap();
//! assert_eq!(cache.load(&order, &Query::id(7_u64)).await.unwrap(), None);
//! # });
//! # }
//! # #[cfg(not(feature = "test-util"))]
//! # fn main() {}
//! ```
//!
//! # Configuration
//!
//! The key prefix, hot cache bound, hot cache maximum age and remote entry
//! expiry are plain values, set on [`VersionedCacheBuilder`] or loaded as
//! [`Options`]. Kinds can be routed around the caches entirely with
//! [`Routing::Passthrough`].
//!
//! Hot cache entries expire after [`DEFAULT_HOT_MAX_AGE`] unless configured
//! otherwise. The bound matters after [`VersionedCache::remove`]: a removed id
//! that is saved again restarts at version 0, and other processes may serve
//! their hot copy of the removed version 0 snapshot until it ages out.
//!
//! # Observability
//!
//! Every branch an operation takes increments a counter reported by
//! [`VersionedCache::stats`] and emits a `tracing` event carrying the
//! `vcache.kind`, `vcache.key` and `vcache.event` fields. With the `metrics`
//! feature, events are also counted on the OpenTelemetry counter
//! `vcache.event.count`.
//!
//! # Features
//!
//! - `metrics` - OpenTelemetry event counter
//! - `test-util` - in-memory remote cache and record source doubles

mod builder;
mod codec;
mod coordinator;
mod error;
mod keys;
mod options;
mod stats;
mod telemetry;
mod version;

#[doc(inline)]
pub use builder::{Routing, VersionedCacheBuilder};
#[doc(inline)]
pub use coordinator::VersionedCache;
#[doc(inline)]
pub use error::{Error, Layer, Result};
#[doc(inline)]
pub use keys::KeyScheme;
#[doc(inline)]
pub use options::{DEFAULT_HOT_MAX_AGE, Options};
#[doc(inline)]
pub use stats::StatsSnapshot;
#[doc(inline)]
pub use vcache_tier::{Kind, Query, Record, RecordId, RecordSource, RemoteCache};
#[doc(inline)]
pub use version::{INITIAL_VERSION, NextVersion, TOMBSTONE, VersionState, VersionStore};
