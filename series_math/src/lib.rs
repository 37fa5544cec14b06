//! # Series Math
//!
//! Numeric kernels shared by the forecasting models.
//! This crate provides the differencing operators, the simplex optimizer,
//! the least squares solver and the scaling helpers that the model families
//! are built from.

use thiserror::Error;

pub mod differencing;
pub mod interpolation;
pub mod linalg;
pub mod optimization;
pub mod scaling;
pub mod stats;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Matrix is singular or not positive definite")]
    SingularMatrix,
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use differencing::DifferencingPolynomial;
pub use interpolation::interpolate_linear;
pub use linalg::{ridge_regression, solve_symmetric};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use scaling::MinMaxScaler;
