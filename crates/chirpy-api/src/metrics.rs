//! Prometheus counters for authentication outcomes
//!
//! The registry is owned by [`AuthMetrics`], which lives in the application
//! state; nothing is registered globally.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct AuthMetrics {
    registry: Registry,
    events: IntCounterVec,
}

impl AuthMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let events = IntCounterVec::new(
            Opts::new(
                "chirpy_auth_events_total",
                "Authentication events by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(events.clone()))?;

        Ok(Self { registry, events })
    }

    /// Count one `operation` ending in `outcome` (`"success"` or an error kind)
    pub fn record(&self, operation: &str, outcome: &str) {
        self.events.with_label_values(&[operation, outcome]).inc();
    }

    pub fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.events.with_label_values(&[operation, outcome]).get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_gather() {
        let metrics = AuthMetrics::new().unwrap();
        metrics.record("login", "success");
        metrics.record("login", "success");
        metrics.record("login", "invalid_credentials");

        assert_eq!(metrics.count("login", "success"), 2);
        assert_eq!(metrics.count("login", "invalid_credentials"), 1);

        let text = metrics.gather().unwrap();
        assert!(text.contains("# TYPE chirpy_auth_events_total counter"));
        assert!(text.contains(r#"chirpy_auth_events_total{operation="login",outcome="success"} 2"#));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = AuthMetrics::new().unwrap();
        let b = AuthMetrics::new().unwrap();
        a.record("refresh", "expired");

        assert_eq!(a.count("refresh", "expired"), 1);
        assert_eq!(b.count("refresh", "expired"), 0);
    }
}
