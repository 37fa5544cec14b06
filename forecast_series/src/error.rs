//! Error types for the forecast_series crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the forecast_series crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The dataset file could not be opened or read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// The dataset does not have the expected shape (missing column, unparseable dates)
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Not enough observations for the requested operation
    #[error("Insufficient data: needed {needed}, got {got} ({context})")]
    InsufficientData {
        needed: usize,
        got: usize,
        context: String,
    },

    /// Error related to argument validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model could not be fitted or produced unusable output
    #[error("Model fitting error ({model}): {message}")]
    ModelFit { model: String, message: String },

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error reading or validating a pipeline configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error writing forecast artifacts
    #[error("Report error: {0}")]
    ReportError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::ReportError(err.to_string())
    }
}

impl ForecastError {
    /// Shorthand for a model fitting failure
    pub fn model_fit(model: impl Into<String>, message: impl Into<String>) -> Self {
        ForecastError::ModelFit {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an insufficient data failure
    pub fn insufficient(needed: usize, got: usize, context: impl Into<String>) -> Self {
        ForecastError::InsufficientData {
            needed,
            got,
            context: context.into(),
        }
    }
}
