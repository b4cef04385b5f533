pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod leads;
pub mod observability;
pub mod policy;

pub use config::Config;
pub use domain::{CalculationError, CalculationRequest, CalculationResult, CalculatorConfig};
pub use engine::{CalculationOverride, Calculator};
pub use leads::{FollowUpDispatcher, LeadSink};
