use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// Name of the single-band "20% at 60, +1% per year" policy.
pub const LINEAR_POLICY: &str = "linear";

/// Name of the five-step banded policy capped at 45%.
pub const BANDED_POLICY: &str = "banded";

/// One age band of an LVR policy.
///
/// The band covers ages from `start` up to (but excluding) the next band's
/// start; the last band is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    /// First age covered by this band
    pub start: u32,

    /// Ratio at `start`
    pub base_rate: Decimal,

    /// Ratio added for each year above `start`
    pub per_year_increment: Decimal,
}

impl AgeBand {
    pub fn new(start: u32, base_rate: Decimal, per_year_increment: Decimal) -> Self {
        AgeBand {
            start,
            base_rate,
            per_year_increment,
        }
    }
}

/// Age-based loan-to-value policy, fully described as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LvrPolicyConfig {
    /// Below this age the ratio is zero
    pub min_age: u32,

    /// Upper bound applied to every computed ratio
    pub max_rate_cap: Decimal,

    /// Bands ordered by ascending start age
    pub bands: Vec<AgeBand>,
}

impl LvrPolicyConfig {
    /// 20% at age 60 plus 1% per year, capped at 50%.
    pub fn linear() -> Self {
        LvrPolicyConfig {
            min_age: 60,
            max_rate_cap: Decimal::new(50, 2),
            bands: vec![AgeBand::new(60, Decimal::new(20, 2), Decimal::new(1, 2))],
        }
    }

    /// 15% at 60 rising 1% per year through age 84, then 0.5% per year
    /// from 40% at 85, capped at 45%.
    pub fn banded() -> Self {
        let one_pct = Decimal::new(1, 2);
        LvrPolicyConfig {
            min_age: 60,
            max_rate_cap: Decimal::new(45, 2),
            bands: vec![
                AgeBand::new(60, Decimal::new(15, 2), one_pct),
                AgeBand::new(65, Decimal::new(20, 2), one_pct),
                AgeBand::new(70, Decimal::new(25, 2), one_pct),
                AgeBand::new(75, Decimal::new(30, 2), one_pct),
                AgeBand::new(80, Decimal::new(35, 2), one_pct),
                AgeBand::new(85, Decimal::new(40, 2), Decimal::new(5, 3)),
            ],
        }
    }

    /// Check structural soundness of the band table.
    ///
    /// Monotonicity of the resulting ratios is not checked.
    pub fn validate(&self, name: &str) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidPolicy {
            policy: name.to_string(),
            reason,
        };

        if self.max_rate_cap <= Decimal::ZERO || self.max_rate_cap > Decimal::ONE {
            return Err(invalid(format!(
                "max_rate_cap must be in (0, 1], got {}",
                self.max_rate_cap
            )));
        }

        let first = self
            .bands
            .first()
            .ok_or_else(|| invalid("at least one age band is required".to_string()))?;

        if first.start > self.min_age {
            return Err(invalid(format!(
                "first band starts at {} but min_age is {}",
                first.start, self.min_age
            )));
        }

        for pair in self.bands.windows(2) {
            if pair[1].start <= pair[0].start {
                return Err(invalid(format!(
                    "band starts must be strictly ascending ({} then {})",
                    pair[0].start, pair[1].start
                )));
            }
        }

        let unit = Decimal::ZERO..=Decimal::ONE;
        for band in &self.bands {
            if !unit.contains(&band.base_rate) || !unit.contains(&band.per_year_increment) {
                return Err(invalid(format!(
                    "band starting at {} has a rate outside [0, 1] (base_rate {}, per_year_increment {})",
                    band.start, band.base_rate, band.per_year_increment
                )));
            }
        }

        Ok(())
    }
}
