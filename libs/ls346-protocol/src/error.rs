//! Curve Protocol Error Types

use thiserror::Error;

/// Result type for ls346-protocol operations
pub type Result<T> = std::result::Result<T, CurveError>;

/// Errors raised by curve transfer, curve buffer and fan-out operations
///
/// Every variant is terminal for the call that produced it; nothing is
/// retried internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    /// Curve number outside the range allowed for the operation
    #[error("{operation}: curve number must be between {min} and {max}, got {curve_num}")]
    InvalidCurveNumber {
        operation: &'static str,
        curve_num: u32,
        min: u32,
        max: u32,
    },

    /// Parallel unit/temperature arrays of unequal length
    #[error("{operation}: both curves must have the same length ({units} units, {temperatures} temperatures)")]
    LengthMismatch {
        operation: &'static str,
        units: usize,
        temperatures: usize,
    },

    /// Curve size outside the instrument's capacity
    #[error("{operation}: size must be between {min} and {max}, got {size}")]
    InvalidSize {
        operation: &'static str,
        size: usize,
        min: usize,
        max: usize,
    },

    /// Zero batch size would never make progress
    #[error("{operation}: batch size must be greater than zero")]
    InvalidBatchSize { operation: &'static str },

    /// Per-card input counts do not add up to the number of readings
    #[error("fan-out: expected {expected} readings from card configuration, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Instrument did not acknowledge a chunk, or the link failed
    #[error("{operation}: curve {curve_num}: {reason}")]
    TransferRejected {
        operation: &'static str,
        curve_num: u32,
        reason: String,
    },
}

impl CurveError {
    pub fn rejected(operation: &'static str, curve_num: u32, reason: impl Into<String>) -> Self {
        CurveError::TransferRejected {
            operation,
            curve_num,
            reason: reason.into(),
        }
    }

    /// Curve number involved in the failure, when there is one
    pub fn curve_num(&self) -> Option<u32> {
        match self {
            CurveError::InvalidCurveNumber { curve_num, .. }
            | CurveError::TransferRejected { curve_num, .. } => Some(*curve_num),
            _ => None,
        }
    }
}
