use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Request field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Postcode,
    PropertyValue,
    AgePrimary,
    AgePartner,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Postcode => "postcode",
            Field::PropertyValue => "propertyValue",
            Field::AgePrimary => "agePrimary",
            Field::AgePartner => "agePartner",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-correctable input problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }

    /// Postcode is not four digits once non-digits are stripped.
    pub fn malformed_postcode() -> Self {
        ValidationError::new(Field::Postcode, "Please enter a valid 4-digit Australian postcode")
    }

    /// Postcode parsed but falls outside every configured service area.
    pub fn not_serviced() -> Self {
        ValidationError::new(Field::Postcode, "Invalid postcode or area not serviced")
    }
}

/// A fully computed loan amount that falls below the minimum loan size.
///
/// This is a business outcome, not a fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Property value or age does not qualify for minimum loan amount")]
pub struct PolicyRejection {
    /// Loan amount after the maximum cap was applied
    pub amount: Decimal,
    /// Configured minimum loan amount
    pub minimum: Decimal,
}

/// Malformed or missing calculator configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("LVR policy '{0}' is not defined")]
    UnknownPolicy(String),

    #[error("LVR policy '{policy}': {reason}")]
    InvalidPolicy { policy: String, reason: String },

    #[error("Service area table: {0}")]
    InvalidServiceArea(String),

    #[error("Loan bounds: {0}")]
    InvalidLoanBounds(String),

    #[error("Eligibility bounds: {0}")]
    InvalidEligibility(String),

    #[error("Projection schedule: {0}")]
    InvalidProjection(String),
}

/// Failure outcome of a single calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    PolicyRejection(#[from] PolicyRejection),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl CalculationError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CalculationError::Validation(_) => "VALIDATION_ERROR",
            CalculationError::PolicyRejection(_) => "POLICY_REJECTION",
            CalculationError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Field the error refers to, for validation failures.
    pub fn field(&self) -> Option<Field> {
        match self {
            CalculationError::Validation(e) => Some(e.field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::not_serviced();
        assert_eq!(err.field, Field::Postcode);
        assert!(err.to_string().contains("not serviced"));
    }

    #[test]
    fn test_calculation_error_codes() {
        let err: CalculationError = ValidationError::malformed_postcode().into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.field(), Some(Field::Postcode));

        let err: CalculationError = PolicyRejection {
            amount: Decimal::new(9000, 0),
            minimum: Decimal::new(10000, 0),
        }
        .into();
        assert_eq!(err.code(), "POLICY_REJECTION");
        assert!(err.field().is_none());
        assert!(err.to_string().contains("minimum loan amount"));

        let err: CalculationError = ConfigurationError::UnknownPolicy("x".to_string()).into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_field_serialization() {
        let json = serde_json::to_string(&Field::PropertyValue).unwrap();
        assert_eq!(json, "\"propertyValue\"");
    }
}
