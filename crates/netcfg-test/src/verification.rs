//! Verification helpers for emitter output
//!
//! Emitters produce ordered lines; these helpers compare them in order and
//! report the first difference.

use thiserror::Error;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Expected {expected} lines, found {actual}")]
    LineCountMismatch { expected: usize, actual: usize },

    #[error("Line {index} mismatch: expected '{expected}', got '{actual}'")]
    LineMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Expected line '{line}' not found")]
    LineNotFound { line: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Verify that `actual` equals `expected` line by line
pub fn verify_lines<S: AsRef<str>>(actual: &[S], expected: &[&str]) -> VerifyResult<()> {
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a.as_ref() != *e {
            return Err(VerificationError::LineMismatch {
                index,
                expected: e.to_string(),
                actual: a.as_ref().to_string(),
            });
        }
    }
    if actual.len() != expected.len() {
        return Err(VerificationError::LineCountMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

/// Verify that `expected` appears in `actual` as an ordered subsequence
pub fn verify_contains_in_order<S: AsRef<str>>(actual: &[S], expected: &[&str]) -> VerifyResult<()> {
    let mut rest = actual.iter();
    for line in expected {
        if !rest.any(|a| a.as_ref() == *line) {
            return Err(VerificationError::LineNotFound {
                line: line.to_string(),
            });
        }
    }
    Ok(())
}

/// Assert that `actual` equals `expected`, printing a diff on mismatch
#[track_caller]
pub fn assert_lines<S: AsRef<str>>(actual: &[S], expected: &[&str]) {
    let actual: Vec<&str> = actual.iter().map(AsRef::as_ref).collect();
    pretty_assertions::assert_eq!(actual, expected);
}
