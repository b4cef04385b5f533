use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::observability::MetricsRegistry;

use super::lead::Lead;
use super::traits::LeadSink;

/// Retry settings applied to each sink independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt (doubles each retry)
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Result of delivering one lead to one sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub sink: String,
    pub attempts: u32,
    pub delivered: bool,
}

/// Hands accepted leads to every registered sink in the background.
///
/// Clones share the same set of in-flight deliveries.
#[derive(Clone)]
pub struct FollowUpDispatcher {
    sinks: Vec<Arc<dyn LeadSink>>,
    retry: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
    in_flight: Arc<Mutex<Vec<JoinHandle<DeliveryOutcome>>>>,
}

impl FollowUpDispatcher {
    pub fn new(retry: RetryPolicy, metrics: Arc<MetricsRegistry>) -> Self {
        FollowUpDispatcher {
            sinks: Vec::new(),
            retry,
            metrics,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a sink.
    pub fn with_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliveries spawned and not yet finished.
    pub fn pending(&self) -> usize {
        self.in_flight
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Spawn one delivery task per sink and return immediately.
    ///
    /// A failing sink never affects the others or the caller. Outcomes are
    /// collected by [`FollowUpDispatcher::drain`].
    pub fn dispatch(&self, lead: Lead) {
        let lead = Arc::new(lead);
        let mut in_flight = self.in_flight.lock();

        // Outcomes of finished deliveries are already logged and counted
        in_flight.retain(|handle| !handle.is_finished());

        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let lead = Arc::clone(&lead);
            let metrics = Arc::clone(&self.metrics);
            let retry = self.retry;

            in_flight.push(tokio::spawn(async move {
                deliver_with_retry(sink, &lead, retry, &metrics).await
            }));
        }
    }

    /// Wait up to `timeout` for tracked deliveries, in dispatch order.
    ///
    /// Deliveries still running at the deadline are aborted and logged.
    pub async fn drain(&self, timeout: Duration) -> Vec<DeliveryOutcome> {
        let handles = std::mem::take(&mut *self.in_flight.lock());
        if handles.is_empty() {
            return Vec::new();
        }

        info!(deliveries = handles.len(), ?timeout, "Draining lead deliveries");

        let deadline = tokio::time::Instant::now() + timeout;
        let mut outcomes = Vec::with_capacity(handles.len());
        let mut abandoned = 0usize;

        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => error!(error = %e, "Lead delivery task failed"),
                Err(_) => {
                    handle.abort();
                    abandoned += 1;
                }
            }
        }

        if abandoned > 0 {
            error!(
                abandoned,
                timeout_ms = timeout.as_millis() as u64,
                "Lead deliveries abandoned at shutdown"
            );
        }

        outcomes
    }
}

async fn deliver_with_retry(
    sink: Arc<dyn LeadSink>,
    lead: &Lead,
    retry: RetryPolicy,
    metrics: &MetricsRegistry,
) -> DeliveryOutcome {
    let max_attempts = retry.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match sink.deliver(lead).await {
            Ok(()) => {
                metrics.record_lead_delivery(true);
                debug!(sink = sink.name(), lead_id = %lead.id, attempt, "Lead delivered");
                return DeliveryOutcome {
                    sink: sink.name().to_string(),
                    attempts: attempt,
                    delivered: true,
                };
            }
            Err(e) => {
                metrics.record_lead_delivery(false);

                if attempt == max_attempts {
                    break;
                }

                let delay = retry.backoff(attempt);
                warn!(
                    sink = sink.name(),
                    lead_id = %lead.id,
                    attempt,
                    max_attempts,
                    ?delay,
                    "Lead delivery failed: {:#}",
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    error!(
        sink = sink.name(),
        lead_id = %lead.id,
        attempts = max_attempts,
        "Giving up on lead delivery"
    );

    DeliveryOutcome {
        sink: sink.name().to_string(),
        attempts: max_attempts,
        delivered: false,
    }
}
