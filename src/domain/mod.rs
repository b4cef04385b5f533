pub mod config;
pub mod error;
pub mod money;
pub mod policy;
pub mod request;
pub mod result;

pub use config::{CalculatorConfig, EligibilityBounds, LoanBounds, ProjectionSchedule, ServiceAreaRange};
pub use error::{CalculationError, ConfigurationError, Field, PolicyRejection, ValidationError};
pub use policy::{AgeBand, LvrPolicyConfig, BANDED_POLICY, LINEAR_POLICY};
pub use request::CalculationRequest;
pub use result::{Breakdown, CalculationResult, Projections};
