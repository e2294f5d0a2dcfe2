//! # Error Types
//!
//! Structured error types for layup_core. Validation failures always carry the
//! name of the offending field so a front end can point the user at it.
//!
//! ## Example
//!
//! ```rust
//! use layup_core::errors::{CalcError, CalcResult};
//!
//! fn validate_thickness(thickness: f64) -> CalcResult<()> {
//!     if thickness <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "thickness".to_string(),
//!             value: thickness.to_string(),
//!             reason: "Thickness must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for layup_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for engine operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, wrong sign, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing from a configuration record
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Material not found in the library
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// An entity would (transitively) contain itself
    #[error("Self-referential composition in '{field}': {name}")]
    SelfReference { field: String, name: String },

    /// A geometry lookup fell outside the defined range
    #[error("Out of range for '{field}': {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Calculation failed (singular stiffness, degenerate geometry, etc.)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// A document record points at an id that is not in the arena
    #[error("Unknown reference: {id}")]
    UnknownReference { id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create a SelfReference error
    pub fn self_reference(field: impl Into<String>, name: impl Into<String>) -> Self {
        CalcError::SelfReference {
            field: field.into(),
            name: name.into(),
        }
    }

    /// Create an OutOfRange error
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        CalcError::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Name of the field a validation error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::InvalidInput { field, .. }
            | CalcError::MissingField { field }
            | CalcError::SelfReference { field, .. }
            | CalcError::OutOfRange { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::SelfReference { .. } => "SELF_REFERENCE",
            CalcError::OutOfRange { .. } => "OUT_OF_RANGE",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::UnknownReference { .. } => "UNKNOWN_REFERENCE",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("e1", "-5.0", "Modulus must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("density").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::material_not_found("unobtainium").error_code(), "MATERIAL_NOT_FOUND");
        assert_eq!(CalcError::out_of_range("x", 2.0, 0.0, 1.0).error_code(), "OUT_OF_RANGE");
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!(CalcError::missing_field("vf").field(), Some("vf"));
        assert_eq!(CalcError::self_reference("fiber", "Carbon").field(), Some("fiber"));
        assert_eq!(CalcError::calculation_failed("abd", "singular").field(), None);
    }
}
