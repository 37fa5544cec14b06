//! Seasonal ARIMA models
//!
//! SARIMA(p,d,q)(P,D,Q,s) shares the CSS estimator of the ARIMA module. The
//! seasonal factors `(1 - Phi B^s)` and `(1 + Theta B^s)` are multiplied into
//! the ordinary lag polynomials and the differencing operator gains
//! `(1 - B^s)^D`.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaOrder, CssEstimator, TrainedArimaModel, DEFAULT_CONFIDENCE_LEVEL};
use crate::models::ForecastModel;
use serde::{Deserialize, Serialize};

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalOrder {
    /// Seasonal AR order
    pub p: usize,
    /// Seasonal differencing order
    pub d: usize,
    /// Seasonal MA order
    pub q: usize,
    /// Season length in observations
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::new(1, 1, 1, 12)
    }
}

/// Seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct SarimaModel {
    estimator: CssEstimator,
}

impl SarimaModel {
    /// Create a SARIMA(p,d,q)(P,D,Q,s) model
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Result<Self> {
        if seasonal.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal.period
            )));
        }

        Ok(Self {
            estimator: CssEstimator {
                name: format!(
                    "SARIMA({},{},{})({},{},{},{})",
                    order.p, order.d, order.q, seasonal.p, seasonal.d, seasonal.q, seasonal.period
                ),
                order,
                seasonal: Some(seasonal),
                confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            },
        })
    }

    /// Coverage of the prediction intervals
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.estimator.confidence_level = level;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.estimator.order
    }

    pub fn seasonal_order(&self) -> Option<SeasonalOrder> {
        self.estimator.seasonal
    }
}

impl Default for SarimaModel {
    fn default() -> Self {
        Self {
            estimator: CssEstimator {
                name: "SARIMA(1,1,1)(1,1,1,12)".to_string(),
                order: ArimaOrder::default(),
                seasonal: Some(SeasonalOrder::default()),
                confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            },
        }
    }
}

impl ForecastModel for SarimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<TrainedArimaModel> {
        self.estimator.fit(train, validation)
    }

    fn name(&self) -> &str {
        &self.estimator.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrainedForecastModel;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::f64::consts::PI;

    fn monthly_pattern(n: usize) -> TimeSeries {
        let values = (0..n)
            .map(|i| 200.0 + 0.3 * i as f64 + 10.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect();
        TimeSeries::daily("y", NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn period_below_two_is_rejected() {
        let err = SarimaModel::new(ArimaOrder::default(), SeasonalOrder::new(1, 1, 1, 1)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn default_name_includes_both_orders() {
        assert_eq!(SarimaModel::default().name(), "SARIMA(1,1,1)(1,1,1,12)");
    }

    #[test]
    fn tracks_deterministic_seasonality() {
        let all = monthly_pattern(144);
        let train = all.slice(0, 100).unwrap();
        let validation = all.slice(100, 122).unwrap();
        let test = all.slice(122, 144).unwrap();

        let trained = SarimaModel::default().train(&train, &validation).unwrap();
        let forecast = trained.forecast(test.timestamps()).unwrap();

        assert_eq!(forecast.len(), test.len());
        // After seasonal and ordinary differencing the pattern is exactly zero,
        // so the forecast reproduces the series
        for (f, a) in forecast.values().iter().zip(test.values()) {
            assert_relative_eq!(*f, *a, epsilon = 1e-6);
        }
    }

    #[test]
    fn needs_enough_seasons() {
        let all = monthly_pattern(30);
        let err = SarimaModel::default()
            .train(&all.slice(0, 20).unwrap(), &all.slice(20, 25).unwrap())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }
}
