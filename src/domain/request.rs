use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inputs to a single borrowing capacity calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    /// Postcode as entered; non-digits are stripped during validation
    pub postcode: String,

    /// Estimated property value
    pub property_value: Decimal,

    /// Age of the primary applicant
    pub age_primary: u32,

    /// Age of the partner, if applying as a couple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_partner: Option<u32>,
}

impl CalculationRequest {
    pub fn new(postcode: impl Into<String>, property_value: Decimal, age_primary: u32) -> Self {
        CalculationRequest {
            postcode: postcode.into(),
            property_value,
            age_primary,
            age_partner: None,
        }
    }

    pub fn with_partner(mut self, age_partner: u32) -> Self {
        self.age_partner = Some(age_partner);
        self
    }

    /// Partner age that participates in the calculation; zero means no partner.
    #[inline]
    pub fn partner_age(&self) -> Option<u32> {
        self.age_partner.filter(|&age| age > 0)
    }

    /// The younger applicant's age, used for the LVR lookup.
    #[inline]
    pub fn effective_age(&self) -> u32 {
        match self.partner_age() {
            Some(partner) => self.age_primary.min(partner),
            None => self.age_primary,
        }
    }
}
