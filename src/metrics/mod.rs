use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for indexing, compilation and result paging
#[derive(Clone)]
pub struct SearchMetrics {
    // Counters
    pub queries_compiled: Counter,
    pub pages_fetched: Counter,
    pub fetch_attempts_failed: Counter,
    pub fetch_hard_failures: Counter,
    pub missing_records: Counter,
    pub fields_emitted: CounterVec,
    pub fields_skipped: Counter,

    // Histograms
    pub fetch_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl SearchMetrics {
    /// Create a new SearchMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries_compiled = Counter::with_opts(Opts::new(
            "cqlindex_queries_compiled_total",
            "Total number of queries compiled to native syntax",
        ))?;
        registry.register(Box::new(queries_compiled.clone()))?;

        let pages_fetched = Counter::with_opts(Opts::new(
            "cqlindex_pages_fetched_total",
            "Total number of result pages fetched",
        ))?;
        registry.register(Box::new(pages_fetched.clone()))?;

        let fetch_attempts_failed = Counter::with_opts(Opts::new(
            "cqlindex_fetch_attempts_failed_total",
            "Total number of page fetch attempts that failed",
        ))?;
        registry.register(Box::new(fetch_attempts_failed.clone()))?;

        let fetch_hard_failures = Counter::with_opts(Opts::new(
            "cqlindex_fetch_hard_failures_total",
            "Total number of page fetches surfaced to the caller as failures",
        ))?;
        registry.register(Box::new(fetch_hard_failures.clone()))?;

        let missing_records = Counter::with_opts(Opts::new(
            "cqlindex_missing_records_total",
            "Total number of record slots returned without a payload",
        ))?;
        registry.register(Box::new(missing_records.clone()))?;

        let fields_emitted = CounterVec::new(
            Opts::new(
                "cqlindex_fields_emitted_total",
                "Physical fields produced by document expansion, by declared type",
            ),
            &["field_type"],
        )?;
        registry.register(Box::new(fields_emitted.clone()))?;

        let fields_skipped = Counter::with_opts(Opts::new(
            "cqlindex_fields_skipped_total",
            "Source fields skipped for an unrecognized type",
        ))?;
        registry.register(Box::new(fields_skipped.clone()))?;

        let fetch_latency = Histogram::with_opts(
            HistogramOpts::new("cqlindex_fetch_latency_seconds", "Result page fetch latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(fetch_latency.clone()))?;

        Ok(Self {
            queries_compiled,
            pages_fetched,
            fetch_attempts_failed,
            fetch_hard_failures,
            missing_records,
            fields_emitted,
            fields_skipped,
            fetch_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a compiled query
    pub fn record_compile(&self) {
        self.queries_compiled.inc();
    }

    /// Record a successful page fetch
    pub fn record_page(&self, duration_secs: f64) {
        self.pages_fetched.inc();
        self.fetch_latency.observe(duration_secs);
    }

    /// Record a failed fetch attempt
    pub fn record_failed_attempt(&self) {
        self.fetch_attempts_failed.inc();
    }

    /// Record a fetch failure surfaced to the caller
    pub fn record_hard_failure(&self) {
        self.fetch_hard_failures.inc();
    }

    /// Record a record slot without payload
    pub fn record_missing(&self) {
        self.missing_records.inc();
    }

    /// Record physical fields produced for one source value
    pub fn record_fields(&self, field_type: &str, count: usize) {
        self.fields_emitted
            .with_label_values(&[field_type])
            .inc_by(count as f64);
    }

    /// Record a skipped source field
    pub fn record_skipped(&self) {
        self.fields_skipped.inc();
    }

    /// Render all metrics in the text exposition format
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = SearchMetrics::new().unwrap();
        metrics.record_page(0.02);
        metrics.record_page(0.03);
        metrics.record_failed_attempt();
        metrics.record_fields("keyword", 6);
        metrics.record_fields("keyword", 1);

        assert_eq!(metrics.pages_fetched.get(), 2.0);
        assert_eq!(metrics.fetch_attempts_failed.get(), 1.0);
        assert_eq!(
            metrics.fields_emitted.with_label_values(&["keyword"]).get(),
            7.0
        );
    }

    #[test]
    fn test_gather() {
        let metrics = SearchMetrics::new().unwrap();
        metrics.record_skipped();
        let text = metrics.gather();
        assert!(text.contains("cqlindex_fields_skipped_total 1"));
    }
}
