//! Forecasting models for time series data
//!
//! Every model family implements the same two traits: a [`ForecastModel`]
//! holds fixed configuration and is trained on the train and validation
//! partitions; the resulting [`TrainedForecastModel`] forecasts the values at
//! a list of future timestamps, starting right after the validation data.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Timestamps the values refer to
    timestamps: Vec<DateTime<Utc>>,
    /// Prediction intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        if values.len() != timestamps.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizon ({})",
                values.len(),
                timestamps.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ValidationError(
                "Forecast contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            values,
            timestamps,
            intervals: None,
        })
    }

    /// Create a new forecast result with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, timestamps)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the timestamps
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Number of forecasted periods
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the forecast is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Forecast the values at `timestamps`, which follow the training data
    fn forecast(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on time series data
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train on the training partition. The validation partition follows it
    /// directly; models use it for monitoring or to bring their state up to
    /// the forecast origin.
    fn train(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod arima;
pub mod lstm;
pub mod prophet;
pub mod sarima;

pub use arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
pub use lstm::{LstmConfig, LstmModel, TrainedLstmModel};
pub use prophet::{ProphetConfig, ProphetModel, TrainedProphetModel};
pub use sarima::{SarimaModel, SeasonalOrder};
