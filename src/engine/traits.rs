use rust_decimal::Decimal;
use std::fmt::Debug;

use super::lvr::LvrPolicy;

/// Ceiling applied to any ratio returned by an override (99%).
pub const MAX_OVERRIDE_RATIO: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

/// Inputs handed to a [`CalculationOverride`] when adjusting the LVR.
#[derive(Debug, Clone, Copy)]
pub struct OverrideContext<'a> {
    pub effective_age: u32,
    pub postcode: &'a str,
    pub property_value: Decimal,
    pub policy: &'a LvrPolicy,
    /// Ratio produced by the policy before adjustment
    pub base_ratio: Decimal,
}

/// Caller-supplied strategy for adjusting a calculation.
///
/// Invoked synchronously, at most once per calculation, and must not call
/// back into the calculator. The adjusted ratio is clamped to
/// `[0, MAX_OVERRIDE_RATIO]` by the caller.
pub trait CalculationOverride: Send + Sync + Debug {
    /// Adjust the policy ratio. Defaults to leaving it unchanged.
    fn adjust_lvr(&self, ctx: &OverrideContext<'_>) -> Decimal {
        ctx.base_ratio
    }

    /// Replace the disclaimer text. Defaults to the configured text.
    fn disclaimer(&self, default: &str) -> String {
        default.to_string()
    }
}

/// Clamp an override's output into the accepted ratio range.
#[inline]
pub fn clamp_override_ratio(ratio: Decimal) -> Decimal {
    ratio.max(Decimal::ZERO).min(MAX_OVERRIDE_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LvrPolicyConfig, LINEAR_POLICY};

    #[derive(Debug)]
    struct Passthrough;

    impl CalculationOverride for Passthrough {}

    #[test]
    fn test_default_override_is_identity() {
        let policy = LvrPolicy::new(LINEAR_POLICY, LvrPolicyConfig::linear()).unwrap();
        let ctx = OverrideContext {
            effective_age: 67,
            postcode: "3000",
            property_value: Decimal::new(900_000, 0),
            policy: &policy,
            base_ratio: Decimal::new(27, 2),
        };

        assert_eq!(Passthrough.adjust_lvr(&ctx), Decimal::new(27, 2));
        assert_eq!(Passthrough.disclaimer("estimate only"), "estimate only");
    }

    #[test]
    fn test_clamp_override_ratio() {
        assert_eq!(MAX_OVERRIDE_RATIO, Decimal::new(99, 2));
        assert_eq!(clamp_override_ratio(Decimal::new(-1, 1)), Decimal::ZERO);
        assert_eq!(clamp_override_ratio(Decimal::new(15, 1)), MAX_OVERRIDE_RATIO);
        assert_eq!(clamp_override_ratio(Decimal::new(3, 1)), Decimal::new(3, 1));
    }
}
