// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed remote cache for the `vcache` versioned cache-aside layer.
//!
//! [`RedisRemote`] implements [`vcache_tier::RemoteCache`] over a Redis
//! connection. The versioned cache relies on two atomic primitives that
//! Redis offers directly or through a script:
//!
//! - create-if-absent, as `SET ... NX`;
//! - increment-if-present, as a script that runs `INCRBY` only when the key
//!   exists, so an evicted version counter is reported as absent instead of
//!   being silently recreated at one.
//!
//! # Examples
//!
//! ```no_run
//! use tick::Clock;
//! use vcache::VersionedCache;
//! use vcache_redis::RedisRemote;
//! use vcache_tier::testing::MemorySource;
//!
//! # async fn example() -> Result<(), vcache_tier::Error> {
//! let remote = RedisRemote::connect("redis://127.0.0.1:6379").await?;
//! let cache = VersionedCache::builder(Clock::new_tokio()).build(remote, MemorySource::new());
//! # Ok(())
//! # }
//! ```

mod remote;

#[doc(inline)]
pub use remote::RedisRemote;
