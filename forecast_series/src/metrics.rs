//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Point-forecast accuracy against held-out actuals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Mean Absolute Percentage Error over non-zero actuals, in percent
    pub mape: Option<f64>,
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate(forecast: &[f64], actual: &[f64]) -> Result<EvaluationMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Forecast ({}) and actual ({}) values must have the same non-zero length",
            forecast.len(),
            actual.len()
        )));
    }
    if forecast.iter().chain(actual.iter()).any(|v| !v.is_finite()) {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must be finite".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    Ok(EvaluationMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2: r_squared(forecast, actual),
        mape: mean_absolute_percentage_error(forecast, actual),
    })
}

/// `1 - SS_res / SS_tot`. Constant actuals score 1.0 for a perfect forecast
/// and 0.0 otherwise.
pub fn r_squared(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_res: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mean_absolute_percentage_error(forecast: &[f64], actual: &[f64]) -> Option<f64> {
    let terms: Vec<f64> = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, f)| ((a - f) / a).abs() * 100.0)
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.iter().sum::<f64>() / terms.len() as f64)
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAE={:.4}, RMSE={:.4}, R^2={:.4}", self.mae, self.rmse, self.r2)?;
        if let Some(mape) = self.mape {
            write!(f, ", MAPE={:.2}%", mape)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn known_values() {
        let forecast = [2.5, 0.0, 2.0, 8.0];
        let actual = [3.0, -0.5, 2.0, 7.0];
        let m = evaluate(&forecast, &actual).unwrap();

        assert_relative_eq!(m.mae, 0.5);
        assert_relative_eq!(m.mse, 0.375);
        assert_relative_eq!(m.rmse, 0.375_f64.sqrt());
        assert_relative_eq!(m.r2, 0.948_608_137, epsilon = 1e-6);
    }

    #[test]
    fn perfect_forecast() {
        let values = [1.0, 2.0, 3.0];
        let m = evaluate(&values, &values).unwrap();
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.mape, Some(0.0));
    }

    #[test]
    fn constant_actuals() {
        assert_eq!(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r_squared(&[4.0, 6.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let m = evaluate(&[1.0, 110.0], &[0.0, 100.0]).unwrap();
        assert_relative_eq!(m.mape.unwrap(), 10.0);
        assert_eq!(evaluate(&[1.0], &[0.0]).unwrap().mape, None);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(evaluate(&[1.0, 2.0], &[1.0]).is_err());
        assert!(evaluate(&[], &[]).is_err());
        assert!(evaluate(&[f64::NAN], &[1.0]).is_err());
    }
}
