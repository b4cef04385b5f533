use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::domain::{CalculationRequest, Field, ValidationError};

/// Numeric form field sent either as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn raw(&self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s.trim().to_string(),
        }
    }

    /// Money: keep digits and the decimal point ("$900,000" -> 900000).
    pub fn to_money(&self) -> Option<Decimal> {
        let cleaned: String = match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect(),
        };

        if cleaned.is_empty() {
            return None;
        }

        Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .ok()
    }

    /// Whole number: keep digits and a minus sign ("67 yrs" -> 67).
    pub fn to_int(&self) -> Option<i64> {
        match self {
            NumberOrString::Number(n) => n.as_i64(),
            NumberOrString::Text(s) => {
                let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
                cleaned.parse().ok()
            }
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, NumberOrString::Text(s) if s.trim().is_empty())
    }
}

/// Body of `POST /v1/calculate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalculateRequest {
    pub postcode: Option<NumberOrString>,
    #[serde(alias = "property_value")]
    pub property_value: Option<NumberOrString>,
    #[serde(alias = "age_primary", alias = "age")]
    pub age_primary: Option<NumberOrString>,
    #[serde(alias = "age_partner")]
    pub age_partner: Option<NumberOrString>,
}

impl CalculateRequest {
    /// Sanitize raw fields into an engine request.
    ///
    /// Only shape is checked here; ranges belong to the engine.
    pub fn into_calculation_request(self) -> Result<CalculationRequest, ValidationError> {
        let postcode = self
            .postcode
            .map(|p| p.raw())
            .filter(|p| !p.is_empty())
            .ok_or_else(ValidationError::malformed_postcode)?;

        let property_value = self
            .property_value
            .as_ref()
            .and_then(NumberOrString::to_money)
            .filter(|v| *v > Decimal::ZERO)
            .ok_or_else(|| ValidationError::new(Field::PropertyValue, "Please enter a valid property value"))?;

        let age_primary = self
            .age_primary
            .as_ref()
            .and_then(NumberOrString::to_int)
            .and_then(|a| u32::try_from(a).ok())
            .filter(|a| *a > 0)
            .ok_or_else(|| ValidationError::new(Field::AgePrimary, "Please enter a valid age"))?;

        let mut request = CalculationRequest::new(postcode, property_value, age_primary);

        match self.age_partner {
            Some(raw) if !raw.is_blank() => {
                let age = raw
                    .to_int()
                    .and_then(|a| u32::try_from(a).ok())
                    .ok_or_else(|| ValidationError::new(Field::AgePartner, "Please enter a valid partner age"))?;
                request = request.with_partner(age);
            }
            _ => {}
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<CalculationRequest, ValidationError> {
        serde_json::from_str::<CalculateRequest>(json)
            .unwrap()
            .into_calculation_request()
    }

    #[test]
    fn test_camel_case_numbers() {
        let req = parse(r#"{"postcode":"3000","propertyValue":900000,"agePrimary":67}"#).unwrap();

        assert_eq!(req.postcode, "3000");
        assert_eq!(req.property_value, Decimal::new(900_000, 0));
        assert_eq!(req.age_primary, 67);
        assert!(req.age_partner.is_none());
    }

    #[test]
    fn test_snake_case_strings_sanitized() {
        let req = parse(
            r#"{"postcode":" 2600 ","property_value":"$1,250,000","age":"72","age_partner":"68"}"#,
        )
        .unwrap();

        assert_eq!(req.postcode, "2600");
        assert_eq!(req.property_value, Decimal::new(1_250_000, 0));
        assert_eq!(req.age_primary, 72);
        assert_eq!(req.partner_age(), Some(68));
    }

    #[test]
    fn test_numeric_postcode_kept_as_digits() {
        // A JSON number loses the leading zero and fails the 4-digit check later
        let req = parse(r#"{"postcode":800,"propertyValue":500000,"agePrimary":70}"#).unwrap();
        assert_eq!(req.postcode, "800");
    }

    #[test]
    fn test_blank_partner_is_absent() {
        let req = parse(r#"{"postcode":"3000","propertyValue":500000,"agePrimary":70,"agePartner":""}"#)
            .unwrap();
        assert!(req.partner_age().is_none());

        let req = parse(r#"{"postcode":"3000","propertyValue":500000,"agePrimary":70,"agePartner":null}"#)
            .unwrap();
        assert!(req.partner_age().is_none());
    }

    #[test]
    fn test_missing_fields() {
        let err = parse(r#"{"propertyValue":500000,"agePrimary":70}"#).unwrap_err();
        assert_eq!(err.field, Field::Postcode);

        let err = parse(r#"{"postcode":"3000","propertyValue":"abc","agePrimary":70}"#).unwrap_err();
        assert_eq!(err.field, Field::PropertyValue);

        let err = parse(r#"{"postcode":"3000","propertyValue":500000,"agePrimary":-3}"#).unwrap_err();
        assert_eq!(err.field, Field::AgePrimary);

        let err = parse(r#"{"postcode":"3000","propertyValue":500000,"agePrimary":70,"agePartner":"x"}"#)
            .unwrap_err();
        assert_eq!(err.field, Field::AgePartner);
    }
}
