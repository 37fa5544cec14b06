//! Descriptive statistics over plain slices

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::{Data, Median, Statistics};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean of an empty series".to_string(),
        ));
    }
    Ok(values.mean())
}

/// Median
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Median of an empty series".to_string(),
        ));
    }
    Ok(Data::new(values.to_vec()).median())
}

/// Population standard deviation
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Standard deviation of an empty series".to_string(),
        ));
    }
    Ok(values.population_std_dev())
}

/// Two-sided standard normal critical value for a confidence level in (0, 1)
pub fn normal_critical_value(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {}",
            level
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_median() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_relative_eq!(mean(&values).unwrap(), 2.8);
        assert_relative_eq!(median(&values).unwrap(), 3.0);
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(mean(&[]).is_err());
        assert!(median(&[]).is_err());
        assert!(population_std_dev(&[]).is_err());
    }

    #[test]
    fn std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0);
    }

    #[test]
    fn critical_values() {
        assert_relative_eq!(normal_critical_value(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert!(normal_critical_value(1.0).is_err());
    }
}
