// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry for tagging cache operations.
//!
//! With the `logs` feature every facade operation can emit a structured
//! `tracing` event, and with the `metrics` feature an OpenTelemetry counter
//! and duration histogram. Both are switched on through the builder.

#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;
#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

use std::time::Duration;

use crate::cache::CacheName;

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Set,
    Get,
    GetMany,
    GetTags,
    GetByTag,
    TagMembers,
    Has,
    Metadata,
    Delete,
    DeleteByTag,
    DropTag,
    Flush,
}

impl CacheOperation {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(dead_code, reason = "only read by logs and metrics")
    )]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "tagcache.set",
            Self::Get => "tagcache.get",
            Self::GetMany => "tagcache.get_many",
            Self::GetTags => "tagcache.get_tags",
            Self::GetByTag => "tagcache.get_by_tag",
            Self::TagMembers => "tagcache.tag_members",
            Self::Has => "tagcache.has",
            Self::Metadata => "tagcache.metadata",
            Self::Delete => "tagcache.delete",
            Self::DeleteByTag => "tagcache.delete_by_tag",
            Self::DropTag => "tagcache.drop_tag",
            Self::Flush => "tagcache.flush",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Stored,
    Deleted,
    Flushed,
    Ok,
    Error,
}

impl CacheActivity {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(dead_code, reason = "only read by logs and metrics")
    )]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "tagcache.hit",
            Self::Miss => "tagcache.miss",
            Self::Stored => "tagcache.stored",
            Self::Deleted => "tagcache.deleted",
            Self::Flushed => "tagcache.flushed",
            Self::Ok => "tagcache.ok",
            Self::Error => "tagcache.error",
        }
    }

    #[cfg(any(feature = "logs", test))]
    pub fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Ok => Severity::Debug,
            Self::Stored | Self::Deleted | Self::Flushed => Severity::Info,
            Self::Error => Severity::Error,
        }
    }
}

/// Records facade operations as logs and metrics, each independently optional.
#[derive(Clone, Debug, Default)]
pub(crate) struct CacheTelemetry {
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    operation_duration: Option<Histogram<f64>>,
}

impl CacheTelemetry {
    #[cfg(any(feature = "logs", test))]
    #[must_use]
    pub(crate) fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub(crate) fn with_meter(self, meter: &Meter) -> Self {
        Self {
            event_counter: Some(metrics::create_event_counter(meter)),
            operation_duration: Some(metrics::create_operation_duration_histogram(meter)),
            ..self
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, reason = "no-op without the logs and metrics features")
    )]
    pub(crate) fn record(&self, name: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, name),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(counter) = &self.event_counter {
                counter.add(1, &attrs);
            }

            if let Some(histogram) = &self.operation_duration {
                histogram.record(duration.as_secs_f64(), &attrs);
            }
        }

        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            Self::emit(name, operation, activity, duration);
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn emit(name: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.as_nanos();

        // Level must be a constant in tracing macros.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    tagcache.name = name,
                    tagcache.operation = op,
                    tagcache.activity = act,
                    tagcache.duration_ns = duration_ns,
                    "tagcache.event"
                )
            };
        }

        match activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
            _ => {}
        }
    }
}
