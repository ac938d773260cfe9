use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counters for mock substitution outcomes.
pub struct MockMetrics {
    registry: Registry,

    /// Substituted responses, by where the example came from
    pub substitutions_total: CounterVec,
    /// Signals that fell back to the original response, by reason
    pub fallbacks_total: CounterVec,
}

impl MockMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let substitutions_total = CounterVec::new(
            Opts::new(
                "exemplar_substitutions_total",
                "Total number of synthesized mock responses",
            ),
            &["source"],
        )?;
        registry.register(Box::new(substitutions_total.clone()))?;

        let fallbacks_total = CounterVec::new(
            Opts::new(
                "exemplar_fallbacks_total",
                "Total number of signals answered with the original response",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(fallbacks_total.clone()))?;

        Ok(Self {
            registry,
            substitutions_total,
            fallbacks_total,
        })
    }

    pub fn record_substitution(&self, source: &str) {
        self.substitutions_total.with_label_values(&[source]).inc();
    }

    pub fn record_fallback(&self, reason: &str) {
        self.fallbacks_total.with_label_values(&[reason]).inc();
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MockMetrics>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MockMetrics>) -> Self {
        Self { collector }
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_encoding() {
        let collector = MockMetrics::new().unwrap();
        collector.record_substitution("route_example");
        collector.record_fallback("no_route");

        let metrics_text = collector.encode().unwrap();
        assert!(metrics_text.contains("exemplar_substitutions_total{source=\"route_example\"} 1"));
        assert!(metrics_text.contains("exemplar_fallbacks_total{reason=\"no_route\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        let collector = Arc::new(MockMetrics::new().unwrap());
        let handler = MetricsHandler::new(collector.clone());

        collector.record_substitution("response_schema");

        let metrics = handler.metrics().await;
        assert!(metrics.contains("exemplar_substitutions_total"));
    }
}
