use rust_decimal::Decimal;

use crate::domain::money::round_currency;
use crate::domain::{LoanBounds, PolicyRejection};

/// Apply a ratio to a property value and enforce loan bounds.
///
/// The bounds are asymmetric: an amount above the maximum is silently capped,
/// an amount below the minimum rejects the request instead of being floored.
pub fn resolve_loan_amount(
    property_value: Decimal,
    ratio: Decimal,
    bounds: &LoanBounds,
) -> Result<Decimal, PolicyRejection> {
    let raw = round_currency(property_value * ratio);
    let capped = raw.min(bounds.max_loan_amount);

    if capped < bounds.min_loan_amount {
        return Err(PolicyRejection {
            amount: capped,
            minimum: bounds.min_loan_amount,
        });
    }

    Ok(capped)
}
