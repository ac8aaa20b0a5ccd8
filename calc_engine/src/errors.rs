//! # Error Types
//!
//! Structured error types for calc_engine. Errors fall into three groups:
//!
//! - **Authoring errors** (`InvalidConfig`, `UnknownUnitType`, `UnsupportedUnit`):
//!   a calculator configuration and the code disagree. These fail fast when the
//!   registry loads or in tests, never in front of a user.
//! - **Request errors** (`UnknownCalculator`, `UnknownPreset`, `InvalidInput`):
//!   the host asked for something that does not exist or sent an unparseable value.
//! - **I/O errors** (`FileError`, `SerializationError`, `VersionMismatch`): only
//!   reachable through [`crate::file_io`].
//!
//! Plain user mistakes (a missing bill amount, a zero loan term) are *not* errors:
//! compute functions report them with `ResultsEnvelope::invalid()`.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::errors::{CalcError, CalcResult};
//!
//! fn validate_term(months: f64) -> CalcResult<()> {
//!     if months <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "loanTerm",
//!             months.to_string(),
//!             "Term must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_engine operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for engine operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value could not be interpreted (bad date, non-numeric text)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A unit string is not known for the given unit type
    #[error("Unsupported unit '{unit}' for unit type '{unit_type}'")]
    UnsupportedUnit { unit: String, unit_type: String },

    /// A configuration names a unit type the engine does not know
    #[error("Unknown unit type: {unit_type}")]
    UnknownUnitType { unit_type: String },

    /// No calculator is registered under this id
    #[error("Calculator not found: {calculator}")]
    UnknownCalculator { calculator: String },

    /// The calculator has no preset with this id
    #[error("Preset '{preset}' not found in calculator '{calculator}'")]
    UnknownPreset { calculator: String, preset: String },

    /// A calculator configuration failed validation
    #[error("Invalid configuration for '{calculator}': {}", .issues.join("; "))]
    InvalidConfig {
        calculator: String,
        issues: Vec<String>,
    },

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

    /// Create an UnsupportedUnit error
    pub fn unsupported_unit(unit: impl Into<String>, unit_type: impl Into<String>) -> Self {
        CalcError::UnsupportedUnit {
            unit: unit.into(),
            unit_type: unit_type.into(),
        }
    }

    /// Create an UnknownUnitType error
    pub fn unknown_unit_type(unit_type: impl Into<String>) -> Self {
        CalcError::UnknownUnitType {
            unit_type: unit_type.into(),
        }
    }

    /// Create an UnknownCalculator error
    pub fn unknown_calculator(calculator: impl Into<String>) -> Self {
        CalcError::UnknownCalculator {
            calculator: calculator.into(),
        }
    }

    /// Create an UnknownPreset error
    pub fn unknown_preset(calculator: impl Into<String>, preset: impl Into<String>) -> Self {
        CalcError::UnknownPreset {
            calculator: calculator.into(),
            preset: preset.into(),
        }
    }

    /// Create an InvalidConfig error from collected issues
    pub fn invalid_config(calculator: impl Into<String>, issues: Vec<String>) -> Self {
        CalcError::InvalidConfig {
            calculator: calculator.into(),
            issues,
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

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// True when the error points at a configuration/code mismatch rather than
    /// anything the end user did. Hosts show these to developers only.
    pub fn is_authoring_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidConfig { .. }
                | CalcError::UnsupportedUnit { .. }
                | CalcError::UnknownUnitType { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnsupportedUnit { .. } => "UNSUPPORTED_UNIT",
            CalcError::UnknownUnitType { .. } => "UNKNOWN_UNIT_TYPE",
            CalcError::UnknownCalculator { .. } => "UNKNOWN_CALCULATOR",
            CalcError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            CalcError::InvalidConfig { .. } => "INVALID_CONFIG",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::unsupported_unit("furlong", "length");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"UnsupportedUnit\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unknown_calculator("nope").error_code(), "UNKNOWN_CALCULATOR");
        assert_eq!(CalcError::unknown_preset("tip", "x").error_code(), "UNKNOWN_PRESET");
    }

    #[test]
    fn test_invalid_config_message_lists_issues() {
        let error = CalcError::invalid_config(
            "tip",
            vec!["first problem".to_string(), "second problem".to_string()],
        );
        assert_eq!(
            error.to_string(),
            "Invalid configuration for 'tip': first problem; second problem"
        );
    }

    #[test]
    fn test_authoring_classification() {
        assert!(CalcError::unsupported_unit("x", "weight").is_authoring_error());
        assert!(CalcError::invalid_config("a", vec![]).is_authoring_error());
        assert!(!CalcError::unknown_calculator("a").is_authoring_error());
        assert!(!CalcError::missing_field("a").is_authoring_error());
    }
}
