use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::ServiceAreaValidator;

pub const MISSING_FIELDS: &str = "Please provide all required fields";
pub const INVALID_EMAIL: &str = "Please provide a valid email address";
pub const PHONE_REQUIRED: &str = "Phone number is required";
pub const CONSENT_REQUIRED: &str = "Please confirm you agree to be contacted.";
pub const INVALID_POSTCODE: &str = "Postcode is missing or invalid.";

/// Lead form as submitted by a client. Nothing is trusted yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadSubmission {
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub postcode: Option<String>,
    #[serde(alias = "property_value")]
    pub property_value: Option<Decimal>,
    #[serde(alias = "age_primary", alias = "age")]
    pub age_primary: Option<u32>,
    #[serde(alias = "age_partner")]
    pub age_partner: Option<u32>,
    #[serde(alias = "loan_purpose")]
    pub loan_purpose: Option<String>,
    #[serde(alias = "estimated_amount")]
    pub estimated_amount: Option<Decimal>,
    pub consent: bool,
}

/// A validated, accepted lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub postcode: Option<String>,
    pub property_value: Option<Decimal>,
    pub age_primary: Option<u32>,
    pub age_partner: Option<u32>,
    pub loan_purpose: Option<String>,
    pub estimated_amount: Option<Decimal>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl LeadSubmission {
    /// Validate and normalize the submission.
    ///
    /// All problems are reported at once, in form order.
    pub fn validate(self, require_phone: bool) -> Result<Lead, Vec<String>> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_lowercase();
        let phone = non_blank(self.phone);

        let mut errors = Vec::new();

        if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
            errors.push(MISSING_FIELDS.to_string());
        } else if !is_valid_email(&email) {
            errors.push(INVALID_EMAIL.to_string());
        }

        if require_phone && phone.is_none() {
            errors.push(PHONE_REQUIRED.to_string());
        }

        if !self.consent {
            errors.push(CONSENT_REQUIRED.to_string());
        }

        let postcode = match non_blank(self.postcode) {
            Some(raw) => match ServiceAreaValidator::parse_postcode(&raw) {
                Some(_) => Some(raw.chars().filter(char::is_ascii_digit).collect()),
                None => {
                    errors.push(INVALID_POSTCODE.to_string());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Lead {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            first_name,
            last_name,
            email,
            phone,
            postcode,
            property_value: self.property_value.filter(|v| *v > Decimal::ZERO),
            age_primary: self.age_primary.filter(|a| *a > 0),
            age_partner: self.age_partner.filter(|a| *a > 0),
            loan_purpose: non_blank(self.loan_purpose),
            estimated_amount: self.estimated_amount.filter(|v| *v > Decimal::ZERO),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
