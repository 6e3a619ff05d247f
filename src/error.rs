// ==============================================================================
// error.rs - Conversion Error Taxonomy
// ==============================================================================
// Description: Errors raised while resolving schemas, extracting rows and
//              reshaping call data
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

use arrow::error::ArrowError;
use thiserror::Error;

use crate::parsers::VcfReadError;

/// Errors that can occur while converting VCF records into typed arrays
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Requested field is neither a fixed/derived attribute nor declared in the header.
    /// Raised at schema-resolution time, never mid-stream.
    #[error("Unknown {section} field: '{field}'")]
    UnknownField { field: String, section: &'static str },

    #[error("Field '{0}' requested more than once")]
    DuplicateField(String),

    /// A value does not fit the storage layout of its column
    #[error("Schema violation in field '{field}': {reason}")]
    SchemaViolation { field: String, reason: String },

    /// Per-sample call data arrays disagree in schema or row count
    #[error("Call data arrays are not aligned: {0}")]
    Alignment(String),

    #[error("Index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("Failed to read VCF input: {0}")]
    Read(#[from] VcfReadError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl ConversionError {
    pub(crate) fn violation(field: &str, reason: impl Into<String>) -> Self {
        ConversionError::SchemaViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::convert::Infallible> for ConversionError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
