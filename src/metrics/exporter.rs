use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::SegmentedMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// This exporter writes in the Prometheus text exposition format so it can be
/// scraped by Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, name: &str, value: u64) {
        self.write_metric("counter", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        self.write_metric("gauge", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<SegmentedMetricsSnapshot>
    for PrometheusTextExporter<W>
{
    fn export(&self, snapshot: &SegmentedMetricsSnapshot) {
        self.write_counter(&self.metric_name("get_calls_total"), snapshot.get_calls);
        self.write_counter(&self.metric_name("get_hits_total"), snapshot.get_hits);
        self.write_counter(&self.metric_name("get_misses_total"), snapshot.get_misses);
        self.write_counter(
            &self.metric_name("evicted_entries_total"),
            snapshot.evicted_entries,
        );
        self.write_counter(&self.metric_name("clears_total"), snapshot.clears);
        self.write_counter(&self.metric_name("promotions_total"), snapshot.promotions);
        self.write_counter(&self.metric_name("demotions_total"), snapshot.demotions);
        self.write_counter(&self.metric_name("constructs_total"), snapshot.constructs);
        self.write_counter(
            &self.metric_name("construct_failures_total"),
            snapshot.construct_failures,
        );
        self.write_counter(
            &self.metric_name("type_mismatches_total"),
            snapshot.type_mismatches,
        );
        self.write_counter(
            &self.metric_name("pool_allocations_total"),
            snapshot.pool_allocations,
        );
        self.write_counter(
            &self.metric_name("pool_releases_total"),
            snapshot.pool_releases,
        );
        self.write_gauge(&self.metric_name("cache_len"), snapshot.cache_len as u64);
        self.write_gauge(
            &self.metric_name("protected_len"),
            snapshot.protected_len as u64,
        );
        self.write_gauge(
            &self.metric_name("probationary_len"),
            snapshot.probationary_len as u64,
        );
        self.write_gauge(&self.metric_name("capacity"), snapshot.capacity as u64);
    }
}
