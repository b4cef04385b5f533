use crate::domain::{ServiceAreaRange, ValidationError};

/// Number of digits a postcode must have once non-digits are stripped.
pub const POSTCODE_DIGITS: usize = 4;

/// Postcode service-area lookup.
///
/// Ranges are checked in configuration order and the first match wins, so a
/// narrow range nested inside a broader one must be listed first to be
/// reachable.
#[derive(Debug, Clone)]
pub struct ServiceAreaValidator {
    ranges: Vec<ServiceAreaRange>,
}

impl ServiceAreaValidator {
    pub fn new(ranges: Vec<ServiceAreaRange>) -> Self {
        ServiceAreaValidator { ranges }
    }

    /// Strip everything but ASCII digits and parse, requiring exactly four
    /// digits. "800" is rejected here even though 800 may be serviced;
    /// "0800" parses to 800.
    pub fn parse_postcode(postcode: &str) -> Option<u32> {
        let digits: String = postcode.chars().filter(char::is_ascii_digit).collect();

        if digits.len() != POSTCODE_DIGITS {
            return None;
        }

        digits.parse().ok()
    }

    /// Resolve the region label for a postcode.
    pub fn validate(&self, postcode: &str) -> Result<&str, ValidationError> {
        let value = Self::parse_postcode(postcode).ok_or_else(ValidationError::malformed_postcode)?;

        self.ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| range.region.as_str())
            .ok_or_else(ValidationError::not_serviced)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
