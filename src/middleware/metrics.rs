//! Response metrics backed by a Prometheus registry.
//!
//! The registry is owned by `AppState` (no process-global registry), recorded
//! into by the instrumentation middleware, and rendered by `GET /metrics`.

use std::sync::Arc;
use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "l10n_center";
const SUBSYSTEM: &str = "api";

#[derive(Clone)]
pub struct HttpMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    // Count of responses per status hundred ("200", "400", ...)
    response_per_status: IntCounterVec,
    // Milliseconds
    response_duration: Histogram,
}

impl std::fmt::Debug for HttpMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMetrics")
            .field("responses", &self.responses_total())
            .finish()
    }
}

impl HttpMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let response_per_status = IntCounterVec::new(
            Opts::new("response_per_status", "Count of responses per status hundred code")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
            &["status"],
        )?;

        let response_duration = Histogram::with_opts(
            HistogramOpts::new("response_duration", "Duration of response in milliseconds")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM)
                .buckets(prometheus::linear_buckets(0.0, 10.0, 10)?),
        )?;

        registry.register(Box::new(response_per_status.clone()))?;
        registry.register(Box::new(response_duration.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                response_per_status,
                response_duration,
            }),
        })
    }

    /// Record one finished response.
    pub fn record(&self, status: u16, elapsed: Duration) {
        let class = (status / 100 * 100).to_string();
        self.inner
            .response_per_status
            .with_label_values(&[class.as_str()])
            .inc();
        self.inner
            .response_duration
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Responses recorded for a status hundred (e.g. `200`, `400`).
    pub fn responses(&self, status_class: u16) -> u64 {
        let class = status_class.to_string();
        self.inner
            .response_per_status
            .get_metric_with_label_values(&[class.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    pub fn responses_total(&self) -> u64 {
        self.inner.response_duration.get_sample_count()
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.inner.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let m = HttpMetrics::new().unwrap();
        assert_eq!(m.responses_total(), 0);
        assert_eq!(m.responses(200), 0);
    }

    #[test]
    fn groups_by_status_hundred() {
        let m = HttpMetrics::new().unwrap();
        m.record(200, Duration::from_millis(3));
        m.record(201, Duration::from_millis(4));
        m.record(404, Duration::from_millis(1));
        m.record(500, Duration::from_millis(12));

        assert_eq!(m.responses(200), 2);
        assert_eq!(m.responses(400), 1);
        assert_eq!(m.responses(500), 1);
        assert_eq!(m.responses_total(), 4);
    }

    #[test]
    fn encodes_namespaced_metrics() {
        let m = HttpMetrics::new().unwrap();
        m.record(200, Duration::from_millis(5));

        let text = m.gather_and_encode().unwrap();
        assert!(text.contains(r#"l10n_center_api_response_per_status{status="200"} 1"#));
        assert!(text.contains("l10n_center_api_response_duration_bucket"));
    }
}
