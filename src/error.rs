//! Error types for the segmentation engine

use thiserror::Error;

/// Errors raised by the numeric engine.
///
/// Numeric edge cases (constant columns, single rows, empty clusters) are
/// handled by substitution and never surface here. Only configurations the
/// engine cannot honour are reported.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SegmentError {
    /// Requested parameters cannot be satisfied by the input,
    /// e.g. more clusters than rows or fewer than two projected features.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two inputs that must agree on a dimension do not.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },
}

impl SegmentError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SegmentError::InvalidConfiguration(message.into())
    }

    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        SegmentError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SegmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SegmentError::invalid("k=5 exceeds 3 rows");
        assert_eq!(err.to_string(), "invalid configuration: k=5 exceeds 3 rows");

        let err = SegmentError::shape("3 columns", "2 columns");
        assert_eq!(err.to_string(), "shape mismatch: expected 3 columns, got 2 columns");
    }
}
