use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::CalculationError;
use crate::engine::Calculator;
use crate::leads::{FollowUpDispatcher, LeadSubmission};
use crate::observability::{MetricsRegistry, TimingGuard};

use super::request::CalculateRequest;
use super::response::{
    CalculationFailure, CalculationSuccess, ErrorResponse, HealthResponse, LeadAccepted,
    LeadRejected, ReadyResponse,
};

/// Shared application state.
pub struct AppState {
    /// Current calculator (updated via watch channel)
    pub calculator_rx: watch::Receiver<Arc<Calculator>>,

    pub metrics: Arc<MetricsRegistry>,

    /// Background delivery of accepted leads
    pub followups: FollowUpDispatcher,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,

    /// Reject leads without a phone number
    pub require_phone: bool,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/calculate", post(handle_calculate))
        .route("/v1/leads", post(handle_lead))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}

fn status_for(err: &CalculationError) -> StatusCode {
    match err {
        CalculationError::Validation(_) => StatusCode::BAD_REQUEST,
        // A rejection is a normal business outcome
        CalculationError::PolicyRejection(_) => StatusCode::OK,
        CalculationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle borrowing capacity calculations.
async fn handle_calculate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let _timing = TimingGuard::new(&state.metrics);

    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed calculate request");
            return (
                StatusCode::BAD_REQUEST,
                Json(CalculationFailure::new(rejection.body_text(), "BAD_REQUEST")),
            )
                .into_response();
        }
    };

    // Snapshot once; a reload mid-request does not affect this calculation
    let calculator = state.calculator_rx.borrow().clone();

    let outcome = body
        .into_calculation_request()
        .map_err(CalculationError::from)
        .and_then(|request| calculator.calculate(&request).map(|result| (request, result)));

    state.metrics.record_calculation(&outcome);

    let elapsed = start.elapsed();
    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        state.metrics.record_budget_exceeded();
        warn!(
            latency_ms = elapsed.as_millis(),
            budget_ms = state.latency_budget_ms,
            "Calculation latency exceeded budget"
        );
    }

    match outcome {
        Ok((request, result)) => {
            info!(
                postcode = %request.postcode,
                region = %result.region,
                effective_age = result.effective_age,
                max_loan_amount = %result.max_loan_amount,
                config_version = calculator.version(),
                latency_us = elapsed.as_micros() as u64,
                "Calculation completed"
            );
            (StatusCode::OK, Json(CalculationSuccess::from(result))).into_response()
        }
        Err(err) => {
            match &err {
                CalculationError::Configuration(e) => {
                    warn!(error = %e, config_version = calculator.version(), "Calculator misconfigured")
                }
                other => info!(code = other.code(), reason = %other, "Calculation declined"),
            }
            (status_for(&err), Json(CalculationFailure::from(&err))).into_response()
        }
    }
}

/// Handle lead submissions.
async fn handle_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Response {
    let Json(submission) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.record_lead(false);
            return (
                StatusCode::BAD_REQUEST,
                Json(LeadRejected::new(vec![rejection.body_text()])),
            )
                .into_response();
        }
    };

    match submission.validate(state.require_phone) {
        Ok(lead) => {
            state.metrics.record_lead(true);
            let lead_id = lead.id;

            info!(lead_id = %lead_id, postcode = ?lead.postcode, "Lead accepted");

            // Deliveries run in the background; the response does not wait on them
            state.followups.dispatch(lead);

            (StatusCode::ACCEPTED, Json(LeadAccepted::new(lead_id))).into_response()
        }
        Err(errors) => {
            state.metrics.record_lead(false);
            info!(errors = errors.len(), "Lead rejected");
            (StatusCode::BAD_REQUEST, Json(LeadRejected::new(errors))).into_response()
        }
    }
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let calculator = state.calculator_rx.borrow();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        config_version: calculator.version().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    let calculator = state.calculator_rx.borrow();

    if calculator.service_areas().is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("No service areas configured", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            config_version: calculator.version().to_string(),
            lvr_policy: calculator.policy().name().to_string(),
            service_areas: calculator.service_areas().len(),
            followup_sinks: state.followups.sink_count(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service_areas = state.calculator_rx.borrow().service_areas().len();

    let metrics = format!(
        r#"# HELP borrowr_uptime_seconds Application uptime in seconds
# TYPE borrowr_uptime_seconds counter
borrowr_uptime_seconds {}

# HELP borrowr_service_areas Number of service areas loaded
# TYPE borrowr_service_areas gauge
borrowr_service_areas {}

{}"#,
        state.start_time.elapsed().as_secs(),
        service_areas,
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CalculatorConfig, LINEAR_POLICY};
    use crate::leads::{MemoryLeadSink, RetryPolicy};
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app_state_with(config: CalculatorConfig, sink: Arc<MemoryLeadSink>) -> Arc<AppState> {
        let calculator = Arc::new(Calculator::new(&config).unwrap());
        let (_tx, rx) = watch::channel(calculator);
        let metrics = Arc::new(MetricsRegistry::new());
        let followups = FollowUpDispatcher::new(
            RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
            },
            Arc::clone(&metrics),
        )
        .with_sink(sink);

        Arc::new(AppState {
            calculator_rx: rx,
            metrics,
            followups,
            start_time: Instant::now(),
            version: "0.1.0-test".to_string(),
            latency_budget_ms: 100,
            require_phone: true,
        })
    }

    fn test_app_state() -> Arc<AppState> {
        test_app_state_with(
            CalculatorConfig::australia(LINEAR_POLICY),
            Arc::new(MemoryLeadSink::new()),
        )
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_app_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let app = create_router(test_app_state());

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_calculate_success() {
        crate::observability::tracing::init_test_tracing();
        let state = test_app_state();
        let app = create_router(Arc::clone(&state));

        let (status, json) = post_json(
            app,
            "/v1/calculate",
            r#"{"postcode":"3000","propertyValue":900000,"agePrimary":67}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["lvrPercentage"], 27.0);
        assert_eq!(json["maxLoanAmount"], 243000.0);
        assert_eq!(json["effectiveAge"], 67);
        assert_eq!(json["region"], "VIC");
        assert!(json["projections"]["year_1_monthly"].is_number());
        assert_eq!(
            state.metrics.calculations_success.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_calculate_not_serviced() {
        let app = create_router(test_app_state());

        let (status, json) = post_json(
            app,
            "/v1/calculate",
            r#"{"postcode":"0999","propertyValue":900000,"agePrimary":67}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], true);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["field"], "postcode");
    }

    #[tokio::test]
    async fn test_calculate_underage() {
        let app = create_router(test_app_state());

        let (status, json) = post_json(
            app,
            "/v1/calculate",
            r#"{"postcode":"3000","property_value":"900,000","age":"58"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Age must be between 60 and 95");
        assert_eq!(json["field"], "agePrimary");
    }

    #[tokio::test]
    async fn test_calculate_policy_rejection_is_ok_status() {
        let mut config = CalculatorConfig::australia(LINEAR_POLICY);
        config.eligibility.min_property_value = Decimal::new(10_000, 0);
        let app = create_router(test_app_state_with(config, Arc::new(MemoryLeadSink::new())));

        let (status, json) = post_json(
            app,
            "/v1/calculate",
            r#"{"postcode":"3000","propertyValue":20000,"agePrimary":60}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["error"], true);
        assert_eq!(json["code"], "POLICY_REJECTION");
        assert!(json.get("field").is_none());
    }

    #[tokio::test]
    async fn test_calculate_malformed_json() {
        let app = create_router(test_app_state());

        let (status, json) = post_json(app, "/v1/calculate", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_lead_accepted_and_delivered() {
        let sink = Arc::new(MemoryLeadSink::new());
        let state = test_app_state_with(CalculatorConfig::australia(LINEAR_POLICY), Arc::clone(&sink));
        let app = create_router(state);

        let (status, json) = post_json(
            app,
            "/v1/leads",
            r#"{"firstName":"Margaret","lastName":"Nguyen","email":"m@example.com","phone":"0400000000","postcode":"3000","consent":true}"#,
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["success"], true);

        let lead_id = json["leadId"].as_str().unwrap().to_string();
        tokio::time::timeout(Duration::from_secs(1), async {
            while sink.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("lead was not delivered");

        assert_eq!(sink.leads()[0].id.to_string(), lead_id);
    }

    #[tokio::test]
    async fn test_lead_deliveries_drained() {
        let sink = Arc::new(MemoryLeadSink::new());
        let state = test_app_state_with(CalculatorConfig::australia(LINEAR_POLICY), Arc::clone(&sink));
        let app = create_router(Arc::clone(&state));

        let (status, _) = post_json(
            app,
            "/v1/leads",
            r#"{"firstName":"Ray","lastName":"Cole","email":"ray@example.com","phone":"0400000000","consent":true}"#,
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let outcomes = state.followups.drain(Duration::from_secs(1)).await;

        assert!(outcomes.iter().all(|o| o.delivered));
        assert_eq!(sink.len(), 1);
        assert_eq!(state.followups.pending(), 0);
    }

    #[tokio::test]
    async fn test_lead_rejected_without_phone() {
        let app = create_router(test_app_state());

        let (status, json) = post_json(
            app,
            "/v1/leads",
            r#"{"firstName":"Margaret","lastName":"Nguyen","email":"m@example.com","consent":true}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], true);
        assert_eq!(json["errors"][0], "Phone number is required");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = test_app_state();
        state.metrics.record_config_reload(true);
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains("borrowr_service_areas 8"));
        assert!(text.contains("borrowr_config_reloads_total 1"));
    }
}
