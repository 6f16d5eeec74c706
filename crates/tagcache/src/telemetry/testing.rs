// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Log and metric capture for telemetry tests.

use std::io::Write;
use std::sync::{Arc, Mutex};

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, Metric, MetricData, ResourceMetrics, ScopeMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
use tracing_subscriber::fmt::MakeWriter;

/// Collects exported metrics in memory.
#[derive(Debug)]
pub(crate) struct MetricTester {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl MetricTester {
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        Self {
            provider: SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build(),
            exporter,
        }
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    /// Flushes and returns every attribute of every data point.
    pub fn collect_attributes(&self) -> Vec<KeyValue> {
        self.provider.force_flush().expect("flush failed");
        self.exporter
            .get_finished_metrics()
            .expect("export failed")
            .iter()
            .flat_map(ResourceMetrics::scope_metrics)
            .flat_map(ScopeMetrics::metrics)
            .flat_map(attributes_of)
            .collect()
    }

    /// Returns the total of all `u64` counter points carrying `attribute`.
    pub fn counter_total(&self, metric_name: &str, attribute: &KeyValue) -> u64 {
        self.provider.force_flush().expect("flush failed");
        self.exporter
            .get_finished_metrics()
            .expect("export failed")
            .iter()
            .flat_map(ResourceMetrics::scope_metrics)
            .flat_map(ScopeMetrics::metrics)
            .filter(|metric| metric.name() == metric_name)
            .map(|metric| match metric.data() {
                AggregatedMetrics::U64(MetricData::Sum(sum)) => sum
                    .data_points()
                    .filter(|point| point.attributes().any(|kv| kv == attribute))
                    .map(opentelemetry_sdk::metrics::data::SumDataPoint::value)
                    .sum(),
                _ => 0,
            })
            .max()
            .unwrap_or_default()
    }

    pub fn assert_attributes_contain(&self, expected: &[KeyValue]) {
        let attributes = self.collect_attributes();
        for attr in expected {
            assert!(
                attributes.contains(attr),
                "attribute {attr:?} not found in collected attributes: {attributes:?}"
            );
        }
    }
}

fn attributes_of(metric: &Metric) -> Vec<KeyValue> {
    macro_rules! points {
        ($data:expr) => {
            match $data {
                MetricData::Gauge(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::Sum(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::Histogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
                MetricData::ExponentialHistogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
            }
        };
    }

    match metric.data() {
        AggregatedMetrics::F64(data) => points!(data),
        AggregatedMetrics::U64(data) => points!(data),
        AggregatedMetrics::I64(data) => points!(data),
    }
}

/// Captures formatted `tracing` output for the current thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().expect("lock poisoned")).to_string()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(
            output.contains(expected),
            "log output does not contain '{expected}', got:\n{output}"
        );
    }

    /// A subscriber writing into this capture; install with `set_default`.
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        use tracing_subscriber::layer::SubscriberExt;
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

pub(crate) struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().expect("lock poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
