use rust_decimal::Decimal;

use crate::domain::{AgeBand, ConfigurationError, LvrPolicyConfig};

/// Age-based loan-to-value ratio lookup over a validated band table.
///
/// The linear policy is just a one-band table; no variant is special-cased.
#[derive(Debug, Clone)]
pub struct LvrPolicy {
    name: String,
    config: LvrPolicyConfig,
}

impl LvrPolicy {
    /// Build from configuration, rejecting malformed band tables.
    pub fn new(name: impl Into<String>, config: LvrPolicyConfig) -> Result<Self, ConfigurationError> {
        let name = name.into();
        config.validate(&name)?;
        Ok(LvrPolicy { name, config })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LvrPolicyConfig {
        &self.config
    }

    pub fn min_age(&self) -> u32 {
        self.config.min_age
    }

    pub fn max_rate_cap(&self) -> Decimal {
        self.config.max_rate_cap
    }

    /// Band with the greatest start not above `age`.
    fn band_for(&self, age: u32) -> Option<&AgeBand> {
        self.config.bands.iter().rev().find(|band| band.start <= age)
    }

    /// Ratio in `[0, max_rate_cap]` for the given effective age.
    ///
    /// Below `min_age` the ratio is zero; callers treat that as ineligible.
    pub fn resolve(&self, effective_age: u32) -> Decimal {
        if effective_age < self.config.min_age {
            return Decimal::ZERO;
        }

        let Some(band) = self.band_for(effective_age) else {
            return Decimal::ZERO;
        };

        let cap = self.config.max_rate_cap;
        let years_into_band = Decimal::from(effective_age - band.start);

        // Overflow can only mean a ratio far above the cap
        let ratio = years_into_band
            .checked_mul(band.per_year_increment)
            .and_then(|step| step.checked_add(band.base_rate))
            .unwrap_or(cap);

        ratio.min(cap).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BANDED_POLICY, LINEAR_POLICY};
    use proptest::prelude::{prop_assert, proptest};

    fn linear() -> LvrPolicy {
        LvrPolicy::new(LINEAR_POLICY, LvrPolicyConfig::linear()).unwrap()
    }

    fn banded() -> LvrPolicy {
        LvrPolicy::new(BANDED_POLICY, LvrPolicyConfig::banded()).unwrap()
    }

    fn pct(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    #[test]
    fn test_below_min_age_is_zero() {
        assert_eq!(linear().resolve(58), Decimal::ZERO);
        assert_eq!(banded().resolve(59), Decimal::ZERO);
        assert_eq!(linear().resolve(0), Decimal::ZERO);
    }

    #[test]
    fn test_linear_policy() {
        let policy = linear();

        assert_eq!(policy.resolve(60), pct(20));
        assert_eq!(policy.resolve(67), pct(27));
        assert_eq!(policy.resolve(85), pct(45));
        assert_eq!(policy.resolve(90), pct(50));
        // Capped beyond 90
        assert_eq!(policy.resolve(95), pct(50));
        assert_eq!(policy.resolve(120), pct(50));
    }

    #[test]
    fn test_banded_policy_band_edges() {
        let policy = banded();

        assert_eq!(policy.resolve(60), pct(15));
        assert_eq!(policy.resolve(64), pct(19));
        assert_eq!(policy.resolve(65), pct(20));
        assert_eq!(policy.resolve(69), pct(24));
        assert_eq!(policy.resolve(70), pct(25));
        assert_eq!(policy.resolve(75), pct(30));
        assert_eq!(policy.resolve(80), pct(35));
        assert_eq!(policy.resolve(84), pct(39));
        assert_eq!(policy.resolve(85), pct(40));
    }

    #[test]
    fn test_banded_policy_top_band_and_cap() {
        let policy = banded();

        assert_eq!(policy.resolve(86), Decimal::new(405, 3));
        assert_eq!(policy.resolve(94), Decimal::new(445, 3));
        assert_eq!(policy.resolve(95), pct(45));
        assert_eq!(policy.resolve(100), pct(45));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let config = LvrPolicyConfig {
            bands: vec![],
            ..LvrPolicyConfig::linear()
        };

        assert!(LvrPolicy::new("broken", config).is_err());
    }

    #[test]
    fn test_extreme_band_values_rejected_at_build() {
        let config = LvrPolicyConfig {
            bands: vec![AgeBand::new(60, Decimal::MAX, Decimal::MAX)],
            ..LvrPolicyConfig::linear()
        };

        assert!(matches!(
            LvrPolicy::new("extreme", config),
            Err(ConfigurationError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn test_resolve_saturates_at_cap_on_overflow() {
        // Bypasses validation to exercise the arithmetic directly
        let policy = LvrPolicy {
            name: "unchecked".to_string(),
            config: LvrPolicyConfig {
                bands: vec![AgeBand::new(60, Decimal::MAX, Decimal::MAX)],
                ..LvrPolicyConfig::linear()
            },
        };

        assert_eq!(policy.resolve(60), pct(50));
        assert_eq!(policy.resolve(62), pct(50));
        assert_eq!(policy.resolve(95), pct(50));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_lvr_monotonic_in_age(age in 0u32..130) {
            for policy in [linear(), banded()] {
                prop_assert!(policy.resolve(age) <= policy.resolve(age + 1));
            }
        }

        #[test]
        fn prop_lvr_within_cap(age in 0u32..200) {
            for policy in [linear(), banded()] {
                let ratio = policy.resolve(age);
                prop_assert!(ratio >= Decimal::ZERO);
                prop_assert!(ratio <= policy.max_rate_cap());
            }
        }
    }
}
