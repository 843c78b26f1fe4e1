// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Bounded in-process hot cache backed by moka.
//!
//! This crate provides [`HotCache`], the fastest read path of the `vcache`
//! versioned cache-aside layer. It maps data keys to record snapshots, evicts
//! the least recently used entry beyond a configured entry count, and can
//! treat entries older than a maximum age as absent. It never decides which
//! version of a record is current; that is the shared tier's job.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use tick::Clock;
//! use vcache_memory::HotCacheBuilder;
//!
//! # futures::executor::block_on(async {
//! let cache = HotCacheBuilder::<String>::new(Clock::new_frozen())
//!     .max_entries(1000)
//!     .max_age(Duration::from_secs(300))
//!     .build();
//!
//! cache.insert("vcache~d~0~shop/product~p1", "snapshot".to_string()).await;
//! let value = cache.get("vcache~d~0~shop/product~p1").await;
//! assert_eq!(value.as_deref(), Some("snapshot"));
//! # });
//! ```

pub mod builder;
mod hot;

#[doc(inline)]
pub use builder::{DEFAULT_MAX_ENTRIES, HotCacheBuilder};
#[doc(inline)]
pub use hot::HotCache;
