use serde::Serialize;
use uuid::Uuid;

use crate::domain::{CalculationError, CalculationResult, Field};

pub const LEAD_ACCEPTED_MESSAGE: &str = "Thank you! We'll be in touch soon.";

/// Successful calculation body.
#[derive(Debug, Serialize)]
pub struct CalculationSuccess {
    pub success: bool,

    #[serde(flatten)]
    pub result: CalculationResult,
}

impl From<CalculationResult> for CalculationSuccess {
    fn from(result: CalculationResult) -> Self {
        CalculationSuccess { success: true, result }
    }
}

/// Failed calculation body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationFailure {
    pub error: bool,
    pub message: String,
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
}

impl CalculationFailure {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        CalculationFailure {
            error: true,
            message: message.into(),
            code: code.into(),
            field: None,
        }
    }
}

impl From<&CalculationError> for CalculationFailure {
    fn from(err: &CalculationError) -> Self {
        CalculationFailure {
            error: true,
            message: err.to_string(),
            code: err.code().to_string(),
            field: err.field(),
        }
    }
}

/// Accepted lead body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAccepted {
    pub success: bool,
    pub lead_id: Uuid,
    pub message: String,
}

impl LeadAccepted {
    pub fn new(lead_id: Uuid) -> Self {
        LeadAccepted {
            success: true,
            lead_id,
            message: LEAD_ACCEPTED_MESSAGE.to_string(),
        }
    }
}

/// Rejected lead body.
#[derive(Debug, Serialize)]
pub struct LeadRejected {
    pub error: bool,
    pub errors: Vec<String>,
}

impl LeadRejected {
    pub fn new(errors: Vec<String>) -> Self {
        LeadRejected { error: true, errors }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub config_version: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub config_version: String,
    pub lvr_policy: String,
    pub service_areas: usize,
    pub followup_sinks: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }
}
