use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Serializes a borrowed decimal as a JSON number.
struct AsFloat<'a>(&'a Decimal);

impl Serialize for AsFloat<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(self.0, serializer)
    }
}

/// Projected loan balances keyed by year offset.
///
/// Serializes as `{"year_1": .., "year_5": .., ..., "year_1_monthly": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projections {
    balances: BTreeMap<u32, Decimal>,
    year_1_monthly: Decimal,
}

impl Projections {
    pub fn new(balances: BTreeMap<u32, Decimal>, year_1_monthly: Decimal) -> Self {
        Projections {
            balances,
            year_1_monthly,
        }
    }

    /// Balance after `year` years, if that offset was projected.
    pub fn year(&self, year: u32) -> Option<Decimal> {
        self.balances.get(&year).copied()
    }

    /// One-year balance with monthly compounding.
    pub fn year_1_monthly(&self) -> Decimal {
        self.year_1_monthly
    }

    /// Projected year offsets in ascending order.
    pub fn years(&self) -> impl Iterator<Item = u32> + '_ {
        self.balances.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Serialize for Projections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.balances.len() + 1))?;
        for (year, balance) in &self.balances {
            map.serialize_entry(&format!("year_{}", year), &AsFloat(balance))?;
        }
        map.serialize_entry("year_1_monthly", &AsFloat(&self.year_1_monthly))?;
        map.end()
    }
}

/// Equity the homeowner keeps after drawing the maximum loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub equity_retained: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub equity_retained_percentage: Decimal,
}

/// Successful outcome of a calculation. All figures are rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Region label of the matched service area
    pub region: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub property_value: Decimal,

    pub age_primary: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_partner: Option<u32>,

    /// Younger applicant's age, used for the LVR lookup
    pub effective_age: u32,

    /// Name of the LVR policy that produced the ratio
    pub policy_name: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub lvr_percentage: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub max_loan_amount: Decimal,

    /// Annual interest rate as a percentage
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,

    pub projections: Projections,

    /// Property value less the year-10 balance, when year 10 is projected
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_equity_remaining: Option<Decimal>,

    pub breakdown: Breakdown,

    pub disclaimer: String,
}
