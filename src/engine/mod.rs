pub mod assembler;
pub mod eligibility;
pub mod loan;
pub mod lvr;
pub mod projection;
pub mod service_area;
pub mod traits;

pub use assembler::{assemble, Assembly};
pub use eligibility::check_eligibility;
pub use loan::resolve_loan_amount;
pub use lvr::LvrPolicy;
pub use projection::project;
pub use service_area::ServiceAreaValidator;
pub use traits::{CalculationOverride, OverrideContext};

use std::sync::Arc;
use tracing::debug;

use crate::domain::{
    CalculationError, CalculationRequest, CalculationResult, CalculatorConfig, ConfigurationError,
    EligibilityBounds, LoanBounds, ProjectionSchedule,
};
use self::traits::clamp_override_ratio;

/// Borrowing capacity calculator built from a validated configuration.
///
/// Immutable once built; share it as `Arc<Calculator>` across requests.
#[derive(Debug, Clone)]
pub struct Calculator {
    version: String,
    service_areas: ServiceAreaValidator,
    policy: LvrPolicy,
    loan_bounds: LoanBounds,
    eligibility: EligibilityBounds,
    schedule: ProjectionSchedule,
    disclaimer: String,
    override_strategy: Option<Arc<dyn CalculationOverride>>,
}

impl Calculator {
    /// Validate the configuration and build the pipeline stages.
    pub fn new(config: &CalculatorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let policy = LvrPolicy::new(config.active_lvr_policy.clone(), config.active_policy()?.clone())?;

        Ok(Calculator {
            version: config.version.clone(),
            service_areas: ServiceAreaValidator::new(config.service_areas.clone()),
            policy,
            loan_bounds: config.loan_bounds,
            eligibility: config.eligibility,
            schedule: config.projection.clone(),
            disclaimer: config.disclaimer.clone(),
            override_strategy: None,
        })
    }

    /// Attach a strategy that may adjust the ratio and disclaimer.
    pub fn with_override(mut self, strategy: Arc<dyn CalculationOverride>) -> Self {
        self.override_strategy = Some(strategy);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn policy(&self) -> &LvrPolicy {
        &self.policy
    }

    pub fn service_areas(&self) -> &ServiceAreaValidator {
        &self.service_areas
    }

    pub fn loan_bounds(&self) -> &LoanBounds {
        &self.loan_bounds
    }

    pub fn eligibility(&self) -> &EligibilityBounds {
        &self.eligibility
    }

    pub fn schedule(&self) -> &ProjectionSchedule {
        &self.schedule
    }

    /// Run one calculation.
    ///
    /// Order: postcode, eligibility, LVR (plus override), loan bounds,
    /// projections, assembly. The first failing stage decides the error.
    pub fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResult, CalculationError> {
        let region = self.service_areas.validate(&request.postcode)?;

        check_eligibility(request, &self.eligibility)?;

        let effective_age = request.effective_age();
        let base_ratio = self.policy.resolve(effective_age);

        let ratio = match &self.override_strategy {
            Some(strategy) => clamp_override_ratio(strategy.adjust_lvr(&OverrideContext {
                effective_age,
                postcode: &request.postcode,
                property_value: request.property_value,
                policy: &self.policy,
                base_ratio,
            })),
            None => base_ratio,
        };

        let max_loan_amount = resolve_loan_amount(request.property_value, ratio, &self.loan_bounds)?;
        let projections = project(max_loan_amount, &self.schedule)?;

        let disclaimer = match &self.override_strategy {
            Some(strategy) => strategy.disclaimer(&self.disclaimer),
            None => self.disclaimer.clone(),
        };

        debug!(
            region = region,
            effective_age = effective_age,
            policy = self.policy.name(),
            ratio = %ratio,
            max_loan_amount = %max_loan_amount,
            "Calculation completed"
        );

        Ok(assemble(Assembly {
            request,
            region,
            policy_name: self.policy.name(),
            ratio,
            max_loan_amount,
            annual_interest_rate: self.schedule.annual_interest_rate,
            projections,
            disclaimer,
        }))
    }
}
