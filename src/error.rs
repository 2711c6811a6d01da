//! Error types for the tender prediction pipeline

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, TenderError>;

/// Errors that can occur in the tender prediction pipeline
#[derive(Error, Debug)]
pub enum TenderError {
    /// Data loading or frame manipulation error
    #[error("Data error: {0}")]
    DataError(String),

    /// Feature extraction error
    #[error("Feature error: {0}")]
    FeatureError(String),

    /// Model training error
    #[error("Training error: {0}")]
    TrainingError(String),

    /// Prediction error
    #[error("Prediction error: {0}")]
    PredictionError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid matrix or vector shape
    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    /// Column not found in the frame
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Model not fitted
    #[error("Model not fitted")]
    ModelNotFitted,

    /// Invalid parameter value
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Training did not converge
    #[error("Failed to converge after {iterations} iterations")]
    ConvergenceError { iterations: usize },

    /// Input validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Numeric computation error
    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for TenderError {
    fn from(err: polars::error::PolarsError) -> Self {
        TenderError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TenderError {
    fn from(err: serde_json::Error) -> Self {
        TenderError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TenderError {
    fn from(err: ndarray::ShapeError) -> Self {
        TenderError::ShapeError {
            expected: "valid array shape".to_string(),
            actual: err.to_string(),
        }
    }
}
