// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Plain-value configuration of a versioned cache.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default maximum age of a hot cache entry.
///
/// A removed record that is saved again restarts at version 0, and another
/// process may still hold the removed version 0 snapshot in its hot cache.
/// The age bound limits how long such a snapshot can be served.
pub const DEFAULT_HOT_MAX_AGE: Duration = Duration::from_secs(60);

/// Configuration values of a versioned cache.
///
/// Options deserialize from any serde format; missing fields take their
/// defaults, and durations are given in whole seconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use vcache::Options;
///
/// let options: Options = serde_json::from_str(r#"{ "prefix": "shop", "hot_max_age": 30 }"#).unwrap();
///
/// assert_eq!(options.prefix, "shop");
/// assert_eq!(options.max_hot, 1111);
/// assert_eq!(options.hot_max_age, Some(Duration::from_secs(30)));
/// assert_eq!(options.expires, Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct Options {
    /// Namespace prepended to every remote cache key.
    pub prefix: String,
    /// Maximum number of snapshots held by the hot cache.
    pub max_hot: u64,
    /// Maximum age of a hot cache entry; unbounded when absent.
    ///
    /// Defaults to [`DEFAULT_HOT_MAX_AGE`]. An explicit `null` disables the
    /// bound, which lets other processes serve a removed record's snapshot
    /// indefinitely once its id is saved again.
    #[serde(deserialize_with = "optional_seconds")]
    pub hot_max_age: Option<Duration>,
    /// Expiry of every remote cache entry.
    #[serde(deserialize_with = "seconds")]
    pub expires: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prefix: "vcache".to_string(),
            max_hot: vcache_memory::DEFAULT_MAX_ENTRIES,
            hot_max_age: Some(DEFAULT_HOT_MAX_AGE),
            expires: Duration::from_secs(3600),
        }
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
}
