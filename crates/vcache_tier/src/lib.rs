// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Collaborator abstractions for the `vcache` versioned cache-aside layer.
//!
//! The versioned cache sits between application code and two external
//! collaborators that it consumes but never implements:
//!
//! - a shared [`RemoteCache`], exposing `get`, `set`, create-if-absent `add`,
//!   increment-if-present `incr` and `delete`;
//! - a durable [`RecordSource`], holding the authoritative records.
//!
//! This crate defines both traits, the record model they exchange ([`Kind`],
//! [`RecordId`], [`Record`], [`Query`]) and the [`Error`] type remote
//! implementations report failures with.
//!
//! # Implementing a Remote Cache
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use vcache_tier::{Error, RemoteCache};
//!
//! struct LocalRemote(Mutex<HashMap<String, Bytes>>);
//!
//! impl RemoteCache for LocalRemote {
//!     async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
//!         Ok(self.0.lock().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: Bytes, _ttl: Duration) -> Result<(), Error> {
//!         self.0.lock().unwrap().insert(key.to_string(), value);
//!         Ok(())
//!     }
//!
//!     async fn add(&self, key: &str, value: Bytes, _ttl: Duration) -> Result<bool, Error> {
//!         let mut data = self.0.lock().unwrap();
//!         if data.contains_key(key) {
//!             return Ok(false);
//!         }
//!         data.insert(key.to_string(), value);
//!         Ok(true)
//!     }
//!
//!     async fn incr(&self, key: &str, delta: u64) -> Result<Option<i64>, Error> {
//!         let mut data = self.0.lock().unwrap();
//!         let Some(current) = data.get(key) else {
//!             return Ok(None);
//!         };
//!         let current: i64 = std::str::from_utf8(current)
//!             .map_err(Error::from_message)?
//!             .parse()
//!             .map_err(Error::from_message)?;
//!         let next = current + delta as i64;
//!         data.insert(key.to_string(), Bytes::from(next.to_string()));
//!         Ok(Some(next))
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<(), Error> {
//!         self.0.lock().unwrap().remove(key);
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
mod record;
pub(crate) mod remote;
pub(crate) mod source;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use record::{Kind, Query, Record, RecordId};
#[doc(inline)]
pub use remote::RemoteCache;
#[doc(inline)]
pub use source::RecordSource;
