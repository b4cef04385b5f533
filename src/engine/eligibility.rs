use rust_decimal::Decimal;

use crate::domain::money::format_currency;
use crate::domain::{CalculationRequest, EligibilityBounds, Field, ValidationError};

/// Caller-level eligibility checks run before the engine pipeline.
///
/// The engine itself never rejects on age or property value; it would simply
/// produce a zero ratio for an under-age applicant.
pub fn check_eligibility(
    request: &CalculationRequest,
    bounds: &EligibilityBounds,
) -> Result<(), ValidationError> {
    check_age(Field::AgePrimary, request.age_primary, bounds)?;

    if let Some(partner) = request.partner_age() {
        check_age(Field::AgePartner, partner, bounds)?;
    }

    check_property_value(request.property_value, bounds)
}

fn check_age(field: Field, age: u32, bounds: &EligibilityBounds) -> Result<(), ValidationError> {
    if age < bounds.min_age || age > bounds.max_age {
        let who = match field {
            Field::AgePartner => "Partner age",
            _ => "Age",
        };
        return Err(ValidationError::new(
            field,
            format!("{} must be between {} and {}", who, bounds.min_age, bounds.max_age),
        ));
    }

    Ok(())
}

fn check_property_value(value: Decimal, bounds: &EligibilityBounds) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::new(
            Field::PropertyValue,
            "Please enter a valid property value",
        ));
    }

    if value < bounds.min_property_value || value > bounds.max_property_value {
        return Err(ValidationError::new(
            Field::PropertyValue,
            format!(
                "Property value must be between {} and {}",
                format_currency(bounds.min_property_value),
                format_currency(bounds.max_property_value)
            ),
        ));
    }

    Ok(())
}
