//! Min-max scaling for neural network inputs

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Maps values linearly onto a feature range using the extremes seen at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    range_min: f64,
    range_max: f64,
    data_min: f64,
    data_max: f64,
}

impl MinMaxScaler {
    /// Fit a scaler onto `[0, 1]`
    pub fn fit(data: &[f64]) -> Result<Self> {
        Self::fit_with_range(data, 0.0, 1.0)
    }

    /// Fit a scaler onto `[range_min, range_max]`
    pub fn fit_with_range(data: &[f64], range_min: f64, range_max: f64) -> Result<Self> {
        if range_min >= range_max {
            return Err(MathError::InvalidInput(format!(
                "Feature range minimum {} must be below maximum {}",
                range_min, range_max
            )));
        }
        if data.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Scaler input contains non-finite values".to_string(),
            ));
        }

        let data_min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            range_min,
            range_max,
            data_min,
            data_max,
        })
    }

    /// Smallest value seen at fit time
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// Largest value seen at fit time
    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    fn scale(&self) -> f64 {
        let span = self.data_max - self.data_min;
        // A constant series maps onto range_min
        if span == 0.0 {
            1.0
        } else {
            (self.range_max - self.range_min) / span
        }
    }

    /// Scale one value
    pub fn transform_value(&self, value: f64) -> f64 {
        self.range_min + (value - self.data_min) * self.scale()
    }

    /// Undo scaling for one value
    pub fn inverse_value(&self, scaled: f64) -> f64 {
        self.data_min + (scaled - self.range_min) / self.scale()
    }

    /// Scale a slice
    pub fn transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&v| self.transform_value(v)).collect()
    }

    /// Undo scaling for a slice
    pub fn inverse_transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&v| self.inverse_value(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scales_onto_unit_interval() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let scaler = MinMaxScaler::fit(&data).unwrap();
        let scaled = scaler.transform(&data);

        assert_eq!(scaled[0], 0.0);
        assert_eq!(scaled[4], 1.0);
        assert_relative_eq!(scaled[2], 0.5);

        let restored = scaler.inverse_transform(&scaled);
        for (a, b) in restored.iter().zip(data.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn custom_range() {
        let scaler = MinMaxScaler::fit_with_range(&[10.0, 50.0], -1.0, 1.0).unwrap();
        assert_eq!(scaler.transform_value(10.0), -1.0);
        assert_eq!(scaler.transform_value(50.0), 1.0);
    }

    #[test]
    fn values_outside_fit_range_extrapolate() {
        let scaler = MinMaxScaler::fit(&[0.0, 100.0]).unwrap();
        assert_relative_eq!(scaler.transform_value(150.0), 1.5);
        assert_relative_eq!(scaler.inverse_value(1.5), 150.0);
    }

    #[test]
    fn constant_series_does_not_divide_by_zero() {
        let scaler = MinMaxScaler::fit(&[7.0, 7.0, 7.0]).unwrap();
        assert_eq!(scaler.transform_value(7.0), 0.0);
        assert_eq!(scaler.inverse_value(0.0), 7.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
        assert!(MinMaxScaler::fit_with_range(&[1.0], 1.0, 0.0).is_err());
    }
}
