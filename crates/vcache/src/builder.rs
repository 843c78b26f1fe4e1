// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring and constructing a [`VersionedCache`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use opentelemetry::metrics::MeterProvider;
use tick::Clock;
use vcache_memory::HotCache;
use vcache_tier::{Kind, RecordSource, RemoteCache};

use crate::stats::Stats;
use crate::telemetry::Telemetry;
use crate::{KeyScheme, Options, VersionStore, VersionedCache};

/// How operations on one record kind are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Routing {
    /// Saves, loads and removes go through the versioned cache.
    #[default]
    Cached,
    /// Every operation goes straight to the record source.
    Passthrough,
}

/// Resolved kind routing, fixed when the cache is built.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoutingTable {
    kinds: HashMap<Kind, Routing>,
    default: Routing,
}

impl RoutingTable {
    pub(crate) fn route(&self, kind: &Kind) -> Routing {
        self.kinds.get(kind).copied().unwrap_or(self.default)
    }
}

/// Builder for a [`VersionedCache`].
///
/// Created by [`VersionedCache::builder`]. Every setting is resolved once by
/// [`build`](Self::build); the resulting cache never changes its
/// configuration.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// use std::time::Duration;
///
/// use tick::Clock;
/// use vcache::VersionedCache;
/// use vcache_tier::testing::{MemorySource, MockRemote};
///
/// let cache = VersionedCache::builder(Clock::new_frozen())
///     .prefix("shop")
///     .max_hot(500)
///     .hot_max_age(Duration::from_secs(30))
///     .only_kinds(["product", "customer"])
///     .build(MockRemote::new(), MemorySource::new());
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct VersionedCacheBuilder {
    clock: Clock,
    options: Options,
    routing: RoutingTable,
    logs_enabled: bool,
    #[cfg(feature = "metrics")]
    meter: Option<opentelemetry::metrics::Meter>,
}

impl VersionedCacheBuilder {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            options: Options::default(),
            routing: RoutingTable::default(),
            logs_enabled: true,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    /// Replaces every option with the given values.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets the namespace prepended to every remote cache key.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    /// Sets the maximum number of snapshots held by the hot cache.
    #[must_use]
    pub fn max_hot(mut self, max_hot: u64) -> Self {
        self.options.max_hot = max_hot;
        self
    }

    /// Sets the age after which a hot cache entry is treated as absent.
    ///
    /// Defaults to [`DEFAULT_HOT_MAX_AGE`](crate::DEFAULT_HOT_MAX_AGE).
    #[must_use]
    pub fn hot_max_age(mut self, max_age: Duration) -> Self {
        self.options.hot_max_age = Some(max_age);
        self
    }

    /// Keeps hot cache entries until they are evicted by the entry bound.
    ///
    /// Other processes may then serve a removed record's snapshot for as long
    /// as they hold it, once the record's id is saved again.
    #[must_use]
    pub fn unbounded_hot_age(mut self) -> Self {
        self.options.hot_max_age = None;
        self
    }

    /// Sets the expiry of every remote cache entry.
    #[must_use]
    pub fn expires(mut self, expires: Duration) -> Self {
        self.options.expires = expires;
        self
    }

    /// Caches the given kind regardless of the default routing.
    #[must_use]
    pub fn cache_kind(mut self, kind: impl Into<Kind>) -> Self {
        self.routing.kinds.insert(kind.into(), Routing::Cached);
        self
    }

    /// Sends every operation on the given kind straight to the record source.
    #[must_use]
    pub fn passthrough_kind(mut self, kind: impl Into<Kind>) -> Self {
        self.routing.kinds.insert(kind.into(), Routing::Passthrough);
        self
    }

    /// Caches exactly the given kinds and passes every other kind through.
    #[must_use]
    pub fn only_kinds<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Kind>,
    {
        self.routing.default = Routing::Passthrough;
        for kind in kinds {
            self.routing.kinds.insert(kind.into(), Routing::Cached);
        }
        self
    }

    /// Sets the routing of kinds without an explicit entry.
    #[must_use]
    pub fn default_routing(mut self, routing: Routing) -> Self {
        self.routing.default = routing;
        self
    }

    /// Enables or disables event logging. Logging is enabled by default.
    #[must_use]
    pub fn logs(mut self, enabled: bool) -> Self {
        self.logs_enabled = enabled;
        self
    }

    /// Counts cache events on a meter created from `provider`.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the cache over the given remote cache and record source.
    #[must_use]
    pub fn build<R, S>(self, remote: R, source: S) -> VersionedCache<R, S>
    where
        R: RemoteCache,
        S: RecordSource,
    {
        let remote = Arc::new(remote);
        let keys = KeyScheme::new(&self.options.prefix);
        let versions = VersionStore::new(Arc::clone(&remote), keys.clone(), self.options.expires);
        let hot = HotCache::builder(self.clock.clone())
            .max_entries(self.options.max_hot)
            .max_age_opt(self.options.hot_max_age)
            .name(format!("{}-hot", self.options.prefix))
            .build();

        let telemetry = Telemetry::new(self.logs_enabled);
        #[cfg(feature = "metrics")]
        let telemetry = match &self.meter {
            Some(meter) => telemetry.with_meter(meter),
            None => telemetry,
        };

        VersionedCache {
            start: self.clock.system_time(),
            remote,
            source,
            versions,
            keys,
            hot,
            expires: self.options.expires,
            routing: self.routing,
            stats: Stats::default(),
            telemetry,
            clock: self.clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_defaults_to_cached() {
        let table = RoutingTable::default();
        assert_eq!(table.route(&Kind::new("any")), Routing::Cached);
    }

    #[test]
    fn only_kinds_passes_other_kinds_through() {
        let builder = VersionedCacheBuilder::new(Clock::new_frozen()).only_kinds(["a", "b"]);

        assert_eq!(builder.routing.route(&Kind::new("a")), Routing::Cached);
        assert_eq!(builder.routing.route(&Kind::new("b")), Routing::Cached);
        assert_eq!(builder.routing.route(&Kind::new("c")), Routing::Passthrough);
    }

    #[test]
    fn explicit_entries_override_default() {
        let builder = VersionedCacheBuilder::new(Clock::new_frozen())
            .passthrough_kind("audit")
            .default_routing(Routing::Cached);

        assert_eq!(builder.routing.route(&Kind::new("audit")), Routing::Passthrough);
        assert_eq!(builder.routing.route(&Kind::new("order")), Routing::Cached);
    }

    #[test]
    fn setters_update_options() {
        let builder = VersionedCacheBuilder::new(Clock::new_frozen())
            .prefix("p")
            .max_hot(3)
            .hot_max_age(Duration::from_secs(1))
            .expires(Duration::from_secs(9));

        assert_eq!(builder.options.prefix, "p");
        assert_eq!(builder.options.max_hot, 3);
        assert_eq!(builder.options.hot_max_age, Some(Duration::from_secs(1)));
        assert_eq!(builder.options.expires, Duration::from_secs(9));
    }

    #[test]
    fn hot_age_is_bounded_unless_disabled() {
        let builder = VersionedCacheBuilder::new(Clock::new_frozen());
        assert_eq!(builder.options.hot_max_age, Some(crate::DEFAULT_HOT_MAX_AGE));

        let builder = builder.unbounded_hot_age();
        assert_eq!(builder.options.hot_max_age, None);
    }
}
