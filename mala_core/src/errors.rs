//! # Error Types
//!
//! Structured error types for mala_core. Calculations themselves never fail:
//! missing references are skipped and empty patterns yield `None`. Errors are
//! reserved for invalid edits (negative weights, unknown ids) and invalid
//! search inputs, and carry enough context for a caller to fix the input.
//!
//! ## Example
//!
//! ```rust
//! use mala_core::errors::{MalaError, MalaResult};
//!
//! fn validate_weight(weight_grams: f64) -> MalaResult<()> {
//!     if weight_grams < 0.0 {
//!         return Err(MalaError::InvalidInput {
//!             field: "weight_grams".to_string(),
//!             value: weight_grams.to_string(),
//!             reason: "Weight cannot be negative".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mala_core operations
pub type MalaResult<T> = Result<T, MalaError>;

/// Structured error type for catalog, settings and search operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum MalaError {
    /// An input value is invalid (negative, out of range, not a number)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No catalog item carries this id
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// The item exists but is not of the expected variant
    #[error("Item {item_id} is a {found}, expected a {expected}")]
    WrongItemKind {
        item_id: String,
        expected: String,
        found: String,
    },

    /// No saved pattern carries this id
    #[error("Pattern not found: {pattern_id}")]
    PatternNotFound { pattern_id: String },
}

impl MalaError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        MalaError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        MalaError::MissingField {
            field: field.into(),
        }
    }

    /// Create an ItemNotFound error
    pub fn item_not_found(item_id: impl ToString) -> Self {
        MalaError::ItemNotFound {
            item_id: item_id.to_string(),
        }
    }

    /// Create a WrongItemKind error
    pub fn wrong_item_kind(item_id: impl ToString, expected: impl Into<String>, found: impl Into<String>) -> Self {
        MalaError::WrongItemKind {
            item_id: item_id.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a PatternNotFound error
    pub fn pattern_not_found(pattern_id: impl ToString) -> Self {
        MalaError::PatternNotFound {
            pattern_id: pattern_id.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            MalaError::InvalidInput { .. } => "INVALID_INPUT",
            MalaError::MissingField { .. } => "MISSING_FIELD",
            MalaError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            MalaError::WrongItemKind { .. } => "WRONG_ITEM_KIND",
            MalaError::PatternNotFound { .. } => "PATTERN_NOT_FOUND",
        }
    }
}

/// Reject negative or non-finite values for a named field.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> MalaResult<()> {
    if !value.is_finite() {
        return Err(MalaError::invalid_input(field, value.to_string(), "Value must be a finite number"));
    }
    if value < 0.0 {
        return Err(MalaError::invalid_input(field, value.to_string(), "Value cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = MalaError::invalid_input("weight_grams", "-0.5", "Value cannot be negative");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: MalaError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(MalaError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(MalaError::item_not_found("bead-1").error_code(), "ITEM_NOT_FOUND");
        assert_eq!(MalaError::pattern_not_found("p").error_code(), "PATTERN_NOT_FOUND");
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("gap", 0.0).is_ok());
        assert!(ensure_non_negative("gap", 2.5).is_ok());
        assert!(ensure_non_negative("gap", -0.1).is_err());
        assert!(ensure_non_negative("gap", f64::NAN).is_err());
    }
}
