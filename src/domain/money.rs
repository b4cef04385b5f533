use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every currency and percentage figure.
pub const CURRENCY_DP: u32 = 2;

/// Round to cents, half away from zero.
#[inline]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a ratio (0.27) to a rounded percentage (27.00).
#[inline]
pub fn ratio_to_percentage(ratio: Decimal) -> Decimal {
    round_currency(ratio * Decimal::ONE_HUNDRED)
}

/// Format a whole-dollar amount with thousands separators, e.g. `$1,250,000`.
pub fn format_currency(amount: Decimal) -> String {
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .abs()
        .to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
