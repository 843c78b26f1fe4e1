// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(feature = "metrics")]
use opentelemetry::{InstrumentationScope, metrics::MeterProvider};
use opentelemetry::metrics::{Counter, Meter};

#[cfg(feature = "metrics")]
const METER_NAME: &str = "vcache";
#[cfg(feature = "metrics")]
const VERSION: &str = "v0.1.0";
#[cfg(feature = "metrics")]
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const EVENT_COUNT_NAME: &str = "vcache.event.count";

#[cfg(feature = "metrics")]
pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(EVENT_COUNT_NAME)
        .with_description("Versioned cache events")
        .with_unit("{event}")
        .build()
}
