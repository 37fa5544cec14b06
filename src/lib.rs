//! # Fin Forecast
//!
//! Umbrella crate for the workspace. It re-exports the member crates:
//!
//! - [`series_math`]: differencing, simplex optimization, least squares and scaling
//! - [`forecast_series`]: ingestion, splitting, the four model families and the pipeline
//! - [`salary_alloc`]: the salary allocation advisor
//!
//! ## Example
//!
//! ```
//! use fin_forecast_workspace::forecast_series::{evaluate, SplitRatios};
//! use fin_forecast_workspace::salary_alloc::{format_currency, Allocation};
//!
//! let metrics = evaluate(&[1.0, 2.0], &[1.0, 3.0]).unwrap();
//! assert_eq!(metrics.mae, 0.5);
//! assert_eq!(SplitRatios::default().sizes(100), (70, 15, 15));
//!
//! let allocation = Allocation::recommended(45_000.0).unwrap();
//! assert_eq!(format_currency(allocation.invest()), "$6,750.00");
//! ```

pub use forecast_series;
pub use salary_alloc;
pub use series_math;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_errors_convert_into_forecast_errors() {
        let err: forecast_series::ForecastError = series_math::MathError::SingularMatrix.into();
        assert!(matches!(err, forecast_series::ForecastError::MathError(_)));
    }
}
