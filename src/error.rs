//! Error types for rect_packer.

use thiserror::Error;

/// Validation error for request data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A rectangle or container dimension is not a positive finite number.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// A margin inset is negative or not finite.
    #[error("Invalid margin: {0}")]
    InvalidMargin(String),

    /// Padding is negative or not finite.
    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    /// A tuning parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors that can occur while packing.
///
/// Rectangles that do not fit are reported as data, never as an error.
#[derive(Debug, Error)]
pub enum PackError {
    /// The input was rejected before packing started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A committed placement has no matching unpacked spec.
    #[error("placed rectangle '{id}' ({width}x{height}) has no matching unpacked spec")]
    UnmatchedPlacement { id: String, width: f64, height: f64 },

    /// The background packing task did not complete.
    #[error("packing task failed: {0}")]
    Task(String),
}
