use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;

use super::error::ConfigurationError;
use super::policy::{LvrPolicyConfig, BANDED_POLICY, LINEAR_POLICY};

/// Disclaimer shown with every estimate unless overridden.
pub const DEFAULT_DISCLAIMER: &str =
    "This is an estimate only and does not constitute financial advice or a credit assessment.";

/// Longest projection horizon accepted in a schedule.
pub const MAX_PROJECTION_YEARS: u32 = 50;

/// Inclusive postcode range mapped to a region label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAreaRange {
    pub min: u32,
    pub max: u32,
    pub region: String,
}

impl ServiceAreaRange {
    pub fn new(min: u32, max: u32, region: impl Into<String>) -> Self {
        ServiceAreaRange {
            min,
            max,
            region: region.into(),
        }
    }

    #[inline]
    pub fn contains(&self, postcode: u32) -> bool {
        postcode >= self.min && postcode <= self.max
    }
}

/// Loan size bounds. Above `max` caps, below `min` rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanBounds {
    pub min_loan_amount: Decimal,
    pub max_loan_amount: Decimal,
}

/// Caller-level eligibility bounds checked before the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityBounds {
    pub min_age: u32,
    pub max_age: u32,
    pub min_property_value: Decimal,
    pub max_property_value: Decimal,
}

/// Year offsets to project plus the annual rate to project at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSchedule {
    /// Annual interest rate as a fraction (0.0895 for 8.95%)
    pub annual_interest_rate: Decimal,

    #[serde(default = "ProjectionSchedule::standard_years")]
    pub years: SmallVec<[u32; 8]>,
}

impl ProjectionSchedule {
    pub fn new(annual_interest_rate: Decimal) -> Self {
        ProjectionSchedule {
            annual_interest_rate,
            years: Self::standard_years(),
        }
    }

    fn standard_years() -> SmallVec<[u32; 8]> {
        smallvec![1, 5, 10, 15, 20]
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.annual_interest_rate.is_sign_negative() || self.annual_interest_rate >= Decimal::ONE {
            return Err(ConfigurationError::InvalidProjection(format!(
                "annual_interest_rate must be in [0, 1), got {}",
                self.annual_interest_rate
            )));
        }

        if self.years.is_empty() {
            return Err(ConfigurationError::InvalidProjection(
                "at least one year offset is required".to_string(),
            ));
        }

        for pair in self.years.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ConfigurationError::InvalidProjection(
                    "year offsets must be strictly ascending".to_string(),
                ));
            }
        }

        if let Some(&year) = self
            .years
            .iter()
            .find(|&&y| y == 0 || y > MAX_PROJECTION_YEARS)
        {
            return Err(ConfigurationError::InvalidProjection(format!(
                "year offset {} outside 1..={}",
                year, MAX_PROJECTION_YEARS
            )));
        }

        Ok(())
    }
}

fn default_disclaimer() -> String {
    DEFAULT_DISCLAIMER.to_string()
}

/// Complete calculator configuration, loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Configuration version identifier
    #[serde(rename = "config_version")]
    pub version: String,

    /// Name of the entry in `lvr_policies` used for calculations
    pub active_lvr_policy: String,

    /// Named LVR policies
    pub lvr_policies: BTreeMap<String, LvrPolicyConfig>,

    /// Ordered postcode ranges; first match wins
    pub service_areas: Vec<ServiceAreaRange>,

    pub loan_bounds: LoanBounds,

    pub eligibility: EligibilityBounds,

    pub projection: ProjectionSchedule,

    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
}

impl CalculatorConfig {
    /// Australian service areas, bounds and both named LVR policies, with
    /// `active_lvr_policy` chosen by the caller.
    ///
    /// ACT is listed ahead of NSW because its range nests inside NSW's.
    pub fn australia(active_lvr_policy: impl Into<String>) -> Self {
        let mut lvr_policies = BTreeMap::new();
        lvr_policies.insert(LINEAR_POLICY.to_string(), LvrPolicyConfig::linear());
        lvr_policies.insert(BANDED_POLICY.to_string(), LvrPolicyConfig::banded());

        CalculatorConfig {
            version: "builtin".to_string(),
            active_lvr_policy: active_lvr_policy.into(),
            lvr_policies,
            service_areas: vec![
                ServiceAreaRange::new(2600, 2618, "ACT"),
                ServiceAreaRange::new(2000, 2999, "NSW"),
                ServiceAreaRange::new(3000, 3999, "VIC"),
                ServiceAreaRange::new(4000, 4999, "QLD"),
                ServiceAreaRange::new(5000, 5999, "SA"),
                ServiceAreaRange::new(6000, 6999, "WA"),
                ServiceAreaRange::new(7000, 7999, "TAS"),
                ServiceAreaRange::new(800, 899, "NT"),
            ],
            loan_bounds: LoanBounds {
                min_loan_amount: Decimal::new(10_000, 0),
                max_loan_amount: Decimal::new(500_000, 0),
            },
            eligibility: EligibilityBounds {
                min_age: 60,
                max_age: 95,
                min_property_value: Decimal::new(200_000, 0),
                max_property_value: Decimal::new(10_000_000, 0),
            },
            projection: ProjectionSchedule::new(Decimal::new(895, 4)),
            disclaimer: default_disclaimer(),
        }
    }

    /// The policy named by `active_lvr_policy`.
    pub fn active_policy(&self) -> Result<&LvrPolicyConfig, ConfigurationError> {
        self.lvr_policies
            .get(&self.active_lvr_policy)
            .ok_or_else(|| ConfigurationError::UnknownPolicy(self.active_lvr_policy.clone()))
    }

    /// Validate every table the engine consumes.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.active_policy()?;

        for (name, policy) in &self.lvr_policies {
            policy.validate(name)?;
        }

        if self.service_areas.is_empty() {
            return Err(ConfigurationError::InvalidServiceArea(
                "at least one range is required".to_string(),
            ));
        }

        for range in &self.service_areas {
            if range.min > range.max || range.max > 9999 {
                return Err(ConfigurationError::InvalidServiceArea(format!(
                    "range {}-{} ({}) is not a valid postcode range",
                    range.min, range.max, range.region
                )));
            }
            if range.region.trim().is_empty() {
                return Err(ConfigurationError::InvalidServiceArea(format!(
                    "range {}-{} has no region label",
                    range.min, range.max
                )));
            }
        }

        let bounds = &self.loan_bounds;
        if bounds.min_loan_amount.is_sign_negative()
            || bounds.max_loan_amount <= Decimal::ZERO
            || bounds.min_loan_amount > bounds.max_loan_amount
        {
            return Err(ConfigurationError::InvalidLoanBounds(format!(
                "expected 0 <= min ({}) <= max ({}) and max > 0",
                bounds.min_loan_amount, bounds.max_loan_amount
            )));
        }

        let eligibility = &self.eligibility;
        if eligibility.min_age > eligibility.max_age {
            return Err(ConfigurationError::InvalidEligibility(format!(
                "min_age {} exceeds max_age {}",
                eligibility.min_age, eligibility.max_age
            )));
        }
        if eligibility.min_property_value.is_sign_negative()
            || eligibility.min_property_value > eligibility.max_property_value
        {
            return Err(ConfigurationError::InvalidEligibility(format!(
                "expected 0 <= min_property_value ({}) <= max_property_value ({})",
                eligibility.min_property_value, eligibility.max_property_value
            )));
        }

        self.projection.validate()
    }
}
