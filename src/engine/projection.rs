use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

use crate::domain::money::round_currency;
use crate::domain::{ConfigurationError, ProjectionSchedule, Projections};

const MONTHS_PER_YEAR: u64 = 12;

/// Compound `principal` at `rate` per period over `periods` periods.
fn compound(principal: Decimal, rate: Decimal, periods: u64) -> Result<Decimal, ConfigurationError> {
    (Decimal::ONE + rate)
        .checked_powu(periods)
        .and_then(|growth| principal.checked_mul(growth))
        .ok_or_else(|| {
            ConfigurationError::InvalidProjection(format!(
                "balance overflow compounding {} at {} over {} periods",
                principal, rate, periods
            ))
        })
}

/// Projected balances assuming no repayments.
///
/// Every year offset is compounded directly from `principal` and rounded on
/// its own, so no year carries the rounding of an earlier one.
pub fn project(principal: Decimal, schedule: &ProjectionSchedule) -> Result<Projections, ConfigurationError> {
    let rate = schedule.annual_interest_rate;

    let balances = schedule
        .years
        .iter()
        .map(|&year| {
            compound(principal, rate, u64::from(year)).map(|balance| (year, round_currency(balance)))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let monthly_rate = rate / Decimal::from(MONTHS_PER_YEAR);
    let year_1_monthly = round_currency(compound(principal, monthly_rate, MONTHS_PER_YEAR)?);

    Ok(Projections::new(balances, year_1_monthly))
}
