//! Error types for baseline estimation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BaselineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BaselineError {
    /// Too few samples to establish a baseline
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Stored baseline cannot be used as a reference frame
    #[error("malformed baseline: {0}")]
    MalformedBaseline(String),
}
