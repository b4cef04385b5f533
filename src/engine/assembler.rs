use rust_decimal::Decimal;

use crate::domain::money::{ratio_to_percentage, round_currency};
use crate::domain::{Breakdown, CalculationRequest, CalculationResult, Projections};

/// Year whose projected balance is reported as remaining equity.
pub const EQUITY_HORIZON_YEAR: u32 = 10;

/// Upstream outputs merged into a [`CalculationResult`].
#[derive(Debug, Clone)]
pub struct Assembly<'a> {
    pub request: &'a CalculationRequest,
    pub region: &'a str,
    pub policy_name: &'a str,
    pub ratio: Decimal,
    pub max_loan_amount: Decimal,
    pub annual_interest_rate: Decimal,
    pub projections: Projections,
    pub disclaimer: String,
}

/// Compose the final result. Only derives the breakdown figures; upstream
/// values are taken as given.
pub fn assemble(parts: Assembly<'_>) -> CalculationResult {
    let property_value = parts.request.property_value;

    let breakdown = Breakdown {
        equity_retained: round_currency(property_value - parts.max_loan_amount),
        equity_retained_percentage: round_currency((Decimal::ONE - parts.ratio) * Decimal::ONE_HUNDRED),
    };

    let estimated_equity_remaining = parts
        .projections
        .year(EQUITY_HORIZON_YEAR)
        .map(|balance| round_currency(property_value - balance));

    CalculationResult {
        region: parts.region.to_string(),
        property_value,
        age_primary: parts.request.age_primary,
        age_partner: parts.request.partner_age(),
        effective_age: parts.request.effective_age(),
        policy_name: parts.policy_name.to_string(),
        lvr_percentage: ratio_to_percentage(parts.ratio),
        max_loan_amount: round_currency(parts.max_loan_amount),
        interest_rate: ratio_to_percentage(parts.annual_interest_rate),
        projections: parts.projections,
        estimated_equity_remaining,
        breakdown,
        disclaimer: parts.disclaimer,
    }
}
