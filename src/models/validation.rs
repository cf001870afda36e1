//! Field-level validation errors
//!
//! Validation failures are reported per field with a machine readable kind,
//! the location of the offending value and a human readable message.

use serde::{Deserialize, Serialize};

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Kind of failure, e.g. `string_too_short`
    #[serde(rename = "type")]
    pub kind: String,
    /// Location of the value, e.g. `["body", "title"]`
    pub loc: Vec<String>,
    /// Human readable message
    pub msg: String,
}

impl FieldError {
    pub fn new(kind: impl Into<String>, loc: &[&str], msg: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
        }
    }

    /// The field name (last element of the location)
    pub fn field(&self) -> Option<&str> {
        self.loc.last().map(String::as_str)
    }
}

/// Check a string's length in characters against optional bounds
pub fn check_length(
    errors: &mut Vec<FieldError>,
    loc: &[&str],
    value: &str,
    min: Option<usize>,
    max: Option<usize>,
) {
    let len = value.chars().count();
    if let Some(min) = min {
        if len < min {
            errors.push(FieldError::new(
                "string_too_short",
                loc,
                format!("String should have at least {} characters", min),
            ));
            return;
        }
    }
    if let Some(max) = max {
        if len > max {
            errors.push(FieldError::new(
                "string_too_long",
                loc,
                format!("String should have at most {} characters", max),
            ));
        }
    }
}

/// Check an integer against inclusive bounds
pub fn check_range(
    errors: &mut Vec<FieldError>,
    loc: &[&str],
    value: i64,
    min: i64,
    max: Option<i64>,
) {
    if value < min {
        errors.push(FieldError::new(
            "greater_than_equal",
            loc,
            format!("Input should be greater than or equal to {}", min),
        ));
    } else if let Some(max) = max {
        if value > max {
            errors.push(FieldError::new(
                "less_than_equal",
                loc,
                format!("Input should be less than or equal to {}", max),
            ));
        }
    }
}
