// src/utils/validation.rs
//! Validation helpers for configuration parameters and numeric inputs

use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },
    /// A `(start, end)` window that is reversed or outside 0..=100
    InvalidWindow {
        field: String,
        start: f64,
        end: f64,
    },
    /// Value is NaN or infinite
    NotFinite(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value '{}' is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::InvalidWindow { field, start, end } => {
                write!(f, "Field '{}' window [{}, {}] must satisfy 0 <= start < end <= 100", field, start, end)
            }
            ValidationError::NotFinite(field) => write!(f, "Field '{}' must be finite", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a value lies in `[min, max]`
pub fn validate_range<T>(value: T, min: T, max: T, field: &str) -> ValidationResult<()>
where
    T: PartialOrd + fmt::Display + Copy,
{
    // NaN fails both comparisons, so check containment positively
    if !(value >= min && value <= max) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Validate a phase-percent window
pub fn validate_window(window: (f64, f64), field: &str) -> ValidationResult<()> {
    let (start, end) = window;
    if !start.is_finite() || !end.is_finite() {
        return Err(ValidationError::NotFinite(field.to_string()));
    }
    if start < 0.0 || end > 100.0 || start >= end {
        return Err(ValidationError::InvalidWindow {
            field: field.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10, "n").is_ok());
        assert!(validate_range(0.5, 0.0, 1.0, "x").is_ok());
        assert!(validate_range(11, 1, 10, "n").is_err());
        assert!(validate_range(f64::NAN, 0.0, 1.0, "x").is_err());
    }

    #[test]
    fn test_validate_window() {
        assert!(validate_window((0.0, 60.0), "w").is_ok());
        assert!(validate_window((60.0, 40.0), "w").is_err());
        assert!(validate_window((-1.0, 40.0), "w").is_err());
        assert!(validate_window((0.0, f64::INFINITY), "w").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = validate_range(300.0, 0.0, 200.0, "force_plate.contact_threshold_n").unwrap_err();
        assert!(err.to_string().contains("force_plate.contact_threshold_n"));
    }
}
