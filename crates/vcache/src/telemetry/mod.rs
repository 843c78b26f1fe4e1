// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and optional metrics for versioned cache events.
//!
//! Every branch the coordinator takes is reported as one [`Event`]. Events
//! are logged through `tracing` with the kind, the remote key and the event
//! name as fields, and, with the `metrics` feature, counted on an
//! OpenTelemetry counter.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter},
};
use tracing::Level;
use vcache_tier::Kind;

pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    VersionCreated,
    VersionIncremented,
    VersionHit,
    VersionMiss,
    HotHit,
    HotMiss,
    NetHit,
    NetMiss,
    Backfilled,
    Dropped,
    Bypassed,
    Uncached,
    Error,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VersionCreated => "vcache.version_created",
            Self::VersionIncremented => "vcache.version_incremented",
            Self::VersionHit => "vcache.version_hit",
            Self::VersionMiss => "vcache.version_miss",
            Self::HotHit => "vcache.hot_hit",
            Self::HotMiss => "vcache.hot_miss",
            Self::NetHit => "vcache.net_hit",
            Self::NetMiss => "vcache.net_miss",
            Self::Backfilled => "vcache.backfilled",
            Self::Dropped => "vcache.dropped",
            Self::Bypassed => "vcache.bypassed",
            Self::Uncached => "vcache.uncached",
            Self::Error => "vcache.error",
        }
    }

    pub fn severity(self) -> Level {
        match self {
            Self::VersionIncremented | Self::VersionHit | Self::VersionMiss | Self::HotHit | Self::HotMiss | Self::NetHit | Self::Bypassed => {
                Level::DEBUG
            }
            Self::VersionCreated | Self::NetMiss | Self::Backfilled | Self::Dropped => Level::INFO,
            Self::Uncached => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

/// Reports versioned cache events to logs and, optionally, metrics.
#[derive(Clone, Debug)]
pub(crate) struct Telemetry {
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
}

impl Telemetry {
    pub(crate) fn new(logs_enabled: bool) -> Self {
        Self {
            logs_enabled,
            #[cfg(any(feature = "metrics", test))]
            event_counter: None,
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub(crate) fn with_meter(mut self, meter: &Meter) -> Self {
        self.event_counter = Some(metrics::create_event_counter(meter));
        self
    }

    pub(crate) fn record(&self, kind: &Kind, key: &str, event: Event) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.event_counter {
            counter.add(
                1,
                &[
                    KeyValue::new(attributes::KIND_NAME, kind.to_string()),
                    KeyValue::new(attributes::EVENT_NAME, event.as_str()),
                ],
            );
        }

        if self.logs_enabled {
            Self::emit(kind, key, event);
        }
    }

    fn emit(kind: &Kind, key: &str, event: Event) {
        let ev = event.as_str();

        // Tracing level must be constant, so a macro selects the level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(vcache.kind = %kind, vcache.key = key, vcache.event = ev, "vcache.event")
            };
        }

        match event.severity() {
            Level::ERROR => emit_event!(error),
            Level::WARN => emit_event!(warn),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics::MeterProvider;

    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn event_names() {
        assert_eq!(Event::VersionCreated.as_str(), "vcache.version_created");
        assert_eq!(Event::VersionIncremented.as_str(), "vcache.version_incremented");
        assert_eq!(Event::VersionHit.as_str(), "vcache.version_hit");
        assert_eq!(Event::VersionMiss.as_str(), "vcache.version_miss");
        assert_eq!(Event::HotHit.as_str(), "vcache.hot_hit");
        assert_eq!(Event::HotMiss.as_str(), "vcache.hot_miss");
        assert_eq!(Event::NetHit.as_str(), "vcache.net_hit");
        assert_eq!(Event::NetMiss.as_str(), "vcache.net_miss");
        assert_eq!(Event::Backfilled.as_str(), "vcache.backfilled");
        assert_eq!(Event::Dropped.as_str(), "vcache.dropped");
        assert_eq!(Event::Bypassed.as_str(), "vcache.bypassed");
        assert_eq!(Event::Uncached.as_str(), "vcache.uncached");
        assert_eq!(Event::Error.as_str(), "vcache.error");
    }

    #[test]
    fn event_severities() {
        assert_eq!(Event::HotHit.severity(), Level::DEBUG);
        assert_eq!(Event::VersionMiss.severity(), Level::DEBUG);
        assert_eq!(Event::VersionCreated.severity(), Level::INFO);
        assert_eq!(Event::Dropped.severity(), Level::INFO);
        assert_eq!(Event::NetMiss.severity(), Level::INFO);
        assert_eq!(Event::Uncached.severity(), Level::WARN);
        assert_eq!(Event::Error.severity(), Level::ERROR);
    }

    #[test]
    fn logs_emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        Telemetry::new(true).record(&Kind::new("shop/product"), "vcache~v~shop/product~p1", Event::Dropped);

        capture.assert_contains(attributes::KIND_NAME);
        capture.assert_contains(attributes::KEY_NAME);
        capture.assert_contains(attributes::EVENT_NAME);
        capture.assert_contains("shop/product");
        capture.assert_contains("vcache~v~shop/product~p1");
        capture.assert_contains(Event::Dropped.as_str());
        capture.assert_contains("INFO");
    }

    #[test]
    fn logs_emit_at_correct_severity_levels() {
        let kind = Kind::new("k");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit(&kind, "key", Event::Error);
        capture.assert_contains("ERROR");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit(&kind, "key", Event::Uncached);
        capture.assert_contains("WARN");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        Telemetry::emit(&kind, "key", Event::HotHit);
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn logs_disabled_emits_nothing() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        Telemetry::new(false).record(&Kind::new("k"), "key", Event::Error);

        assert!(capture.output().is_empty());
    }

    #[test]
    fn metrics_record_kind_and_event() {
        let tester = MetricTester::new();
        let meter = tester.meter_provider().meter("vcache");
        let telemetry = Telemetry::new(false).with_meter(&meter);

        telemetry.record(&Kind::new("shop/product"), "key", Event::NetHit);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::KIND_NAME, "shop/product"),
            KeyValue::new(attributes::EVENT_NAME, Event::NetHit.as_str()),
        ]);
    }
}
