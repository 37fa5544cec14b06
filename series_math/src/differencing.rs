//! Differencing operators for integrated models
//!
//! Ordinary and seasonal differencing are both expressed as a lag
//! polynomial `(1 - B)^d (1 - B^s)^D`, so applying and inverting them is the
//! same code path for ARIMA and SARIMA.

use crate::{MathError, Result};

/// Multiply two lag polynomials given by their coefficients (index = lag)
pub fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Lag polynomial `(1 - B)^d (1 - B^s)^D`
#[derive(Debug, Clone, PartialEq)]
pub struct DifferencingPolynomial {
    coefficients: Vec<f64>,
}

impl DifferencingPolynomial {
    /// Build the polynomial for `d` ordinary and `seasonal_d` seasonal differences
    pub fn new(d: usize, seasonal_d: usize, period: usize) -> Result<Self> {
        if seasonal_d > 0 && period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal differencing needs a period of at least 2, got {}",
                period
            )));
        }

        let mut coefficients = vec![1.0];
        for _ in 0..d {
            coefficients = polymul(&coefficients, &[1.0, -1.0]);
        }
        for _ in 0..seasonal_d {
            let mut seasonal = vec![0.0; period + 1];
            seasonal[0] = 1.0;
            seasonal[period] = -1.0;
            coefficients = polymul(&coefficients, &seasonal);
        }

        Ok(Self { coefficients })
    }

    /// Number of observations consumed by differencing
    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Polynomial coefficients, index = lag
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Difference a series. The result is `order()` values shorter than the input.
    pub fn apply(&self, series: &[f64]) -> Result<Vec<f64>> {
        let order = self.order();
        if series.len() <= order {
            return Err(MathError::InsufficientData(format!(
                "Differencing of order {} needs more than {} observations, got {}",
                order,
                order,
                series.len()
            )));
        }

        Ok((order..series.len())
            .map(|t| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .map(|(k, c)| c * series[t - k])
                    .sum()
            })
            .collect())
    }

    /// Undo differencing for values that follow `history`.
    ///
    /// `differenced` holds values of the differenced process for the periods
    /// right after the end of `history`; the result holds the matching values
    /// on the original scale.
    pub fn integrate(&self, history: &[f64], differenced: &[f64]) -> Result<Vec<f64>> {
        let order = self.order();
        if history.len() < order {
            return Err(MathError::InsufficientData(format!(
                "Integration of order {} needs {} historical values, got {}",
                order,
                order,
                history.len()
            )));
        }

        let mut extended = history[history.len() - order..].to_vec();
        let mut out = Vec::with_capacity(differenced.len());
        for &w in differenced {
            let t = extended.len();
            let lagged: f64 = self.coefficients[1..]
                .iter()
                .enumerate()
                .map(|(k, c)| c * extended[t - 1 - k])
                .sum();
            let value = w - lagged;
            extended.push(value);
            out.push(value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn difference(series: &[f64], d: usize) -> Vec<f64> {
        let mut result = series.to_vec();
        for _ in 0..d {
            if result.len() <= 1 {
                return Vec::new();
            }
            result = result.windows(2).map(|w| w[1] - w[0]).collect();
        }
        result
    }

    #[test]
    fn first_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 2), vec![1.0, 1.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn polynomial_product() {
        // (1 - B)(1 - B^2) = 1 - B - B^2 + B^3
        assert_eq!(
            polymul(&[1.0, -1.0], &[1.0, 0.0, -1.0]),
            vec![1.0, -1.0, -1.0, 1.0]
        );
    }

    #[test]
    fn seasonal_polynomial_matches_two_step_differencing() {
        let series: Vec<f64> = (0..30).map(|i| (i as f64).powi(2) + (i % 4) as f64).collect();
        let poly = DifferencingPolynomial::new(1, 1, 4).unwrap();
        assert_eq!(poly.order(), 5);

        let direct = poly.apply(&series).unwrap();
        let seasonal: Vec<f64> = (4..series.len()).map(|t| series[t] - series[t - 4]).collect();
        let two_step = difference(&seasonal, 1);

        assert_eq!(direct.len(), two_step.len());
        for (a, b) in direct.iter().zip(two_step.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn integrate_inverts_apply() {
        let series: Vec<f64> = (0..40).map(|i| 10.0 + 0.5 * i as f64 + ((i % 12) as f64).sin()).collect();
        let poly = DifferencingPolynomial::new(1, 1, 12).unwrap();
        let diffed = poly.apply(&series).unwrap();

        let split = 30;
        let tail = &diffed[split - poly.order()..];
        let rebuilt = poly.integrate(&series[..split], tail).unwrap();

        for (a, b) in rebuilt.iter().zip(series[split..].iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_short_input() {
        let poly = DifferencingPolynomial::new(0, 1, 12).unwrap();
        assert!(poly.apply(&[1.0; 12]).is_err());
        assert!(DifferencingPolynomial::new(0, 1, 1).is_err());
    }
}
