use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::CalculationError;

/// Upper bounds, in seconds, of the latency histogram buckets.
pub const LATENCY_BUCKET_BOUNDS: [&str; 6] = ["0.001", "0.005", "0.01", "0.05", "0.1", "+Inf"];

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total calculation requests processed
    pub calculations_total: AtomicU64,

    /// Calculation requests by outcome
    pub calculations_success: AtomicU64,
    pub calculations_validation_error: AtomicU64,
    pub calculations_policy_rejection: AtomicU64,
    pub calculations_configuration_error: AtomicU64,

    /// Calculation latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,
    pub latency_sum_micros: AtomicU64,

    /// Calculations that exceeded the latency budget
    pub latency_budget_exceeded: AtomicU64,

    /// Config reloads
    pub config_reloads_total: AtomicU64,
    pub config_reload_errors: AtomicU64,

    /// Lead capture
    pub leads_accepted_total: AtomicU64,
    pub leads_rejected_total: AtomicU64,
    pub lead_deliveries_total: AtomicU64,
    pub lead_delivery_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a calculation outcome.
    pub fn record_calculation<T>(&self, outcome: &Result<T, CalculationError>) {
        self.calculations_total.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Ok(_) => &self.calculations_success,
            Err(CalculationError::Validation(_)) => &self.calculations_validation_error,
            Err(CalculationError::PolicyRejection(_)) => &self.calculations_policy_rejection,
            Err(CalculationError::Configuration(_)) => &self.calculations_configuration_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record calculation latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;
        self.latency_sum_micros.fetch_add(micros, Ordering::Relaxed);

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a calculation that ran past its latency budget.
    pub fn record_budget_exceeded(&self) {
        self.latency_budget_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a config reload.
    pub fn record_config_reload(&self, success: bool) {
        self.config_reloads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.config_reload_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a lead submission.
    pub fn record_lead(&self, accepted: bool) {
        if accepted {
            self.leads_accepted_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.leads_rejected_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a follow-up delivery attempt.
    pub fn record_lead_delivery(&self, success: bool) {
        self.lead_deliveries_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.lead_delivery_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Cumulative latency bucket counts, one per `LATENCY_BUCKET_BOUNDS` entry.
    pub fn latency_buckets(&self) -> [u64; 6] {
        let raw = [
            &self.latency_under_1ms,
            &self.latency_1_5ms,
            &self.latency_5_10ms,
            &self.latency_10_50ms,
            &self.latency_50_100ms,
            &self.latency_over_100ms,
        ];

        let mut running = 0;
        raw.map(|counter| {
            running += counter.load(Ordering::Relaxed);
            running
        })
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let buckets = self.latency_buckets();
        let latency = LATENCY_BUCKET_BOUNDS
            .iter()
            .zip(buckets)
            .map(|(le, count)| {
                format!("borrowr_calculation_latency_seconds_bucket{{le=\"{}\"}} {}\n", le, count)
            })
            .collect::<String>();
        let latency_sum = self.latency_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;

        format!(
            r#"# HELP borrowr_calculations_total Total number of calculation requests
# TYPE borrowr_calculations_total counter
borrowr_calculations_total {}

# HELP borrowr_calculations Calculation requests by outcome
# TYPE borrowr_calculations counter
borrowr_calculations{{outcome="success"}} {}
borrowr_calculations{{outcome="validation_error"}} {}
borrowr_calculations{{outcome="policy_rejection"}} {}
borrowr_calculations{{outcome="configuration_error"}} {}

# HELP borrowr_calculation_latency_seconds Calculation latency histogram
# TYPE borrowr_calculation_latency_seconds histogram
{}borrowr_calculation_latency_seconds_sum {}
borrowr_calculation_latency_seconds_count {}

# HELP borrowr_latency_budget_exceeded_total Calculations over the latency budget
# TYPE borrowr_latency_budget_exceeded_total counter
borrowr_latency_budget_exceeded_total {}

# HELP borrowr_config_reloads_total Config reload operations
# TYPE borrowr_config_reloads_total counter
borrowr_config_reloads_total {}

# HELP borrowr_config_reload_errors_total Config reload errors
# TYPE borrowr_config_reload_errors_total counter
borrowr_config_reload_errors_total {}

# HELP borrowr_leads Lead submissions by outcome
# TYPE borrowr_leads counter
borrowr_leads{{outcome="accepted"}} {}
borrowr_leads{{outcome="rejected"}} {}

# HELP borrowr_lead_deliveries_total Follow-up delivery attempts
# TYPE borrowr_lead_deliveries_total counter
borrowr_lead_deliveries_total {}

# HELP borrowr_lead_delivery_failures_total Failed follow-up delivery attempts
# TYPE borrowr_lead_delivery_failures_total counter
borrowr_lead_delivery_failures_total {}
"#,
            self.calculations_total.load(Ordering::Relaxed),
            self.calculations_success.load(Ordering::Relaxed),
            self.calculations_validation_error.load(Ordering::Relaxed),
            self.calculations_policy_rejection.load(Ordering::Relaxed),
            self.calculations_configuration_error.load(Ordering::Relaxed),
            latency,
            latency_sum,
            buckets[buckets.len() - 1],
            self.latency_budget_exceeded.load(Ordering::Relaxed),
            self.config_reloads_total.load(Ordering::Relaxed),
            self.config_reload_errors.load(Ordering::Relaxed),
            self.leads_accepted_total.load(Ordering::Relaxed),
            self.leads_rejected_total.load(Ordering::Relaxed),
            self.lead_deliveries_total.load(Ordering::Relaxed),
            self.lead_delivery_failures.load(Ordering::Relaxed),
        )
    }
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PolicyRejection, ValidationError};
    use rust_decimal::Decimal;

    #[test]
    fn test_record_calculation() {
        let metrics = MetricsRegistry::new();

        metrics.record_calculation(&Ok::<_, CalculationError>(()));
        metrics.record_calculation(&Ok::<_, CalculationError>(()));
        metrics.record_calculation::<()>(&Err(ValidationError::not_serviced().into()));
        metrics.record_calculation::<()>(&Err(PolicyRejection {
            amount: Decimal::new(5_000, 0),
            minimum: Decimal::new(10_000, 0),
        }
        .into()));

        assert_eq!(metrics.calculations_total.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.calculations_success.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.calculations_validation_error.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.calculations_policy_rejection.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_latency() {
        let metrics = MetricsRegistry::new();

        {
            let _guard = TimingGuard::new(&metrics);
        }

        let recorded = metrics.latency_under_1ms.load(Ordering::Relaxed)
            + metrics.latency_1_5ms.load(Ordering::Relaxed)
            + metrics.latency_5_10ms.load(Ordering::Relaxed)
            + metrics.latency_10_50ms.load(Ordering::Relaxed)
            + metrics.latency_50_100ms.load(Ordering::Relaxed)
            + metrics.latency_over_100ms.load(Ordering::Relaxed);
        assert_eq!(recorded, 1);
    }

    #[test]
    fn test_lead_counters() {
        let metrics = MetricsRegistry::new();

        metrics.record_lead(true);
        metrics.record_lead(false);
        metrics.record_lead_delivery(true);
        metrics.record_lead_delivery(false);

        assert_eq!(metrics.leads_accepted_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.leads_rejected_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.lead_deliveries_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.lead_delivery_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsRegistry::new();
        metrics.record_calculation(&Ok::<_, CalculationError>(()));
        metrics.record_config_reload(false);

        let output = metrics.to_prometheus();

        assert!(output.contains("borrowr_calculations_total 1"));
        assert!(output.contains("borrowr_calculations{outcome=\"success\"} 1"));
        assert!(output.contains("borrowr_config_reload_errors_total 1"));
    }

    #[test]
    fn test_latency_histogram_is_cumulative() {
        let metrics = MetricsRegistry::new();
        metrics.latency_under_1ms.store(3, Ordering::Relaxed);
        metrics.latency_5_10ms.store(2, Ordering::Relaxed);
        metrics.latency_over_100ms.store(1, Ordering::Relaxed);

        assert_eq!(metrics.latency_buckets(), [3, 3, 5, 5, 5, 6]);

        let output = metrics.to_prometheus();
        assert!(output.contains("# TYPE borrowr_calculation_latency_seconds histogram"));
        assert!(output.contains("borrowr_calculation_latency_seconds_bucket{le=\"0.001\"} 3"));
        assert!(output.contains("borrowr_calculation_latency_seconds_bucket{le=\"0.01\"} 5"));
        assert!(output.contains("borrowr_calculation_latency_seconds_bucket{le=\"+Inf\"} 6"));
        assert!(output.contains("borrowr_calculation_latency_seconds_count 6"));
    }
}
