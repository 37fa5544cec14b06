//! Prophet-style additive decomposition
//!
//! `y(t) = trend(t) + seasonality(t) + noise`, where the trend is piecewise
//! linear with potential changepoints spread over the first part of the
//! history and each seasonality is a truncated Fourier series. Priors on the
//! changepoint rate adjustments and the seasonal coefficients are Gaussian,
//! so the MAP estimate is a ridge regression with one penalty per column.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use series_math::{ridge_regression, stats};
use std::f64::consts::PI;
use tracing::debug;

/// Observation noise scale (in units of the scaled target) used to turn prior
/// scales into ridge penalties
const NOISE_SCALE: f64 = 0.05;

/// Penalty on the base growth rate and offset
const TREND_PENALTY: f64 = 1e-6;

/// Configuration of the Prophet-style model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProphetConfig {
    /// Number of potential changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints are placed
    pub changepoint_range: f64,
    /// Prior scale of the changepoint rate adjustments
    pub changepoint_prior_scale: f64,
    /// Prior scale of the seasonal Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Fit a yearly seasonality
    pub yearly_seasonality: bool,
    pub yearly_fourier_order: usize,
    /// Fit a weekly seasonality when the data is sampled more often than weekly
    pub weekly_seasonality: bool,
    pub weekly_fourier_order: usize,
    /// Fit a daily seasonality when the data is sampled more often than daily
    pub daily_seasonality: bool,
    pub daily_fourier_order: usize,
    /// Coverage of the uncertainty intervals
    pub interval_width: f64,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: true,
            yearly_fourier_order: 10,
            weekly_seasonality: true,
            weekly_fourier_order: 3,
            daily_seasonality: true,
            daily_fourier_order: 4,
            interval_width: 0.8,
        }
    }
}

impl ProphetConfig {
    /// Check the configuration for values the fit cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Changepoint range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if self.changepoint_prior_scale <= 0.0 || self.seasonality_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "Prior scales must be positive".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Interval width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// One Fourier block of the design matrix
#[derive(Debug, Clone, PartialEq)]
struct Seasonality {
    name: &'static str,
    period_days: f64,
    order: usize,
}

impl Seasonality {
    fn features(&self, timestamp: &DateTime<Utc>, row: &mut Vec<f64>) {
        let days = timestamp.timestamp() as f64 / 86_400.0;
        for n in 1..=self.order {
            let angle = 2.0 * PI * n as f64 * days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

/// Prophet-style forecasting model
#[derive(Debug, Clone)]
pub struct ProphetModel {
    config: ProphetConfig,
}

impl ProphetModel {
    pub fn new(config: ProphetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProphetConfig {
        &self.config
    }

    fn seasonalities(&self, step: Option<Duration>) -> Vec<Seasonality> {
        let step_days = step.map(|s| s.num_seconds() as f64 / 86_400.0).unwrap_or(1.0);
        let mut out = Vec::new();
        if self.config.yearly_seasonality && self.config.yearly_fourier_order > 0 {
            out.push(Seasonality {
                name: "yearly",
                period_days: 365.25,
                order: self.config.yearly_fourier_order,
            });
        }
        if self.config.weekly_seasonality && self.config.weekly_fourier_order > 0 && step_days < 7.0 {
            out.push(Seasonality {
                name: "weekly",
                period_days: 7.0,
                order: self.config.weekly_fourier_order,
            });
        }
        if self.config.daily_seasonality && self.config.daily_fourier_order > 0 && step_days < 1.0 {
            out.push(Seasonality {
                name: "daily",
                period_days: 1.0,
                order: self.config.daily_fourier_order,
            });
        }
        out
    }
}

impl Default for ProphetModel {
    fn default() -> Self {
        Self {
            config: ProphetConfig::default(),
        }
    }
}

/// Changepoint locations in scaled time, evenly spread over the first
/// `range` share of the history
fn select_changepoints(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = ((t.len() as f64) * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }
    (1..=n)
        .map(|i| {
            let idx = ((i as f64) * (hist_size - 1) as f64 / n as f64).round() as usize;
            t[idx]
        })
        .collect()
}

impl ForecastModel for ProphetModel {
    type Trained = TrainedProphetModel;

    fn train(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<TrainedProphetModel> {
        let history = train.concat(validation)?;
        if history.len() < 3 {
            return Err(ForecastError::insufficient(3, history.len(), "Prophet history"));
        }

        let timestamps = history.timestamps();
        let start = timestamps[0];
        let span_seconds = (timestamps[timestamps.len() - 1] - start).num_seconds() as f64;

        let y_scale = history
            .values()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y: Vec<f64> = history.values().iter().map(|v| v / y_scale).collect();

        let t: Vec<f64> = timestamps
            .iter()
            .map(|ts| (*ts - start).num_seconds() as f64 / span_seconds)
            .collect();
        let changepoints = select_changepoints(&t, self.config.n_changepoints, self.config.changepoint_range);
        let seasonalities = self.seasonalities(history.typical_step());

        let mut fitted = TrainedProphetModel {
            start,
            span_seconds,
            y_scale,
            changepoints,
            seasonalities,
            coefficients: Vec::new(),
            sigma: 0.0,
            interval_width: self.config.interval_width,
        };

        let design: Vec<Vec<f64>> = timestamps.iter().map(|ts| fitted.design_row(ts)).collect();
        let n_seasonal: usize = fitted.seasonalities.iter().map(|s| 2 * s.order).sum();
        let mut penalties = vec![TREND_PENALTY, TREND_PENALTY];
        penalties.extend(
            std::iter::repeat((NOISE_SCALE / self.config.changepoint_prior_scale).powi(2))
                .take(fitted.changepoints.len()),
        );
        penalties.extend(
            std::iter::repeat((NOISE_SCALE / self.config.seasonality_prior_scale).powi(2)).take(n_seasonal),
        );

        fitted.coefficients = ridge_regression(&design, &y, &penalties)
            .map_err(|e| ForecastError::model_fit("Prophet", e.to_string()))?;

        let residuals: Vec<f64> = design
            .iter()
            .zip(y.iter())
            .map(|(row, target)| (target - fitted.predict_row(row)) * y_scale)
            .collect();
        fitted.sigma = stats::population_std_dev(&residuals)?;

        debug!(
            "Prophet fitted on {} observations with {} changepoints and seasonalities {:?}",
            history.len(),
            fitted.changepoints.len(),
            fitted.seasonalities.iter().map(|s| s.name).collect::<Vec<_>>()
        );

        Ok(fitted)
    }

    fn name(&self) -> &str {
        "Prophet"
    }
}

/// Trained Prophet-style model
#[derive(Debug, Clone)]
pub struct TrainedProphetModel {
    start: DateTime<Utc>,
    span_seconds: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    /// `[offset, rate, deltas..., fourier...]` in scaled units
    coefficients: Vec<f64>,
    /// Residual standard deviation on the original scale
    sigma: f64,
    interval_width: f64,
}

impl TrainedProphetModel {
    fn scaled_time(&self, timestamp: &DateTime<Utc>) -> f64 {
        (*timestamp - self.start).num_seconds() as f64 / self.span_seconds
    }

    fn design_row(&self, timestamp: &DateTime<Utc>) -> Vec<f64> {
        let t = self.scaled_time(timestamp);
        let mut row = Vec::with_capacity(2 + self.changepoints.len());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|s| (t - s).max(0.0)));
        for seasonality in &self.seasonalities {
            seasonality.features(timestamp, &mut row);
        }
        row
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        row.iter().zip(self.coefficients.iter()).map(|(x, b)| x * b).sum()
    }

    /// Trend component at `timestamp`, on the original scale
    pub fn trend(&self, timestamp: &DateTime<Utc>) -> f64 {
        let row = self.design_row(timestamp);
        let n_trend = 2 + self.changepoints.len();
        self.predict_row(&row[..n_trend]) * self.y_scale
    }

    /// Changepoint locations as timestamps
    pub fn changepoints(&self) -> Vec<DateTime<Utc>> {
        self.changepoints
            .iter()
            .map(|s| self.start + Duration::seconds((s * self.span_seconds).round() as i64))
            .collect()
    }

    /// Residual standard deviation of the fit
    pub fn residual_std(&self) -> f64 {
        self.sigma
    }
}

impl TrainedForecastModel for TrainedProphetModel {
    fn forecast(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult> {
        let z = stats::normal_critical_value(self.interval_width)?;
        let half_width = z * self.sigma;

        let values: Vec<f64> = timestamps
            .iter()
            .map(|ts| self.predict_row(&self.design_row(ts)) * self.y_scale)
            .collect();
        let intervals = values.iter().map(|v| (v - half_width, v + half_width)).collect();

        ForecastResult::new_with_intervals(values, timestamps.to_vec(), intervals)
    }

    fn name(&self) -> &str {
        "Prophet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn daily(values: Vec<f64>) -> TimeSeries {
        TimeSeries::daily("y", NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), values).unwrap()
    }

    fn trend_only() -> ProphetConfig {
        ProphetConfig {
            yearly_seasonality: false,
            weekly_seasonality: false,
            daily_seasonality: false,
            ..Default::default()
        }
    }

    #[test]
    fn extrapolates_linear_trend() {
        let all = daily((0..200).map(|i| 10.0 + 2.0 * i as f64).collect());
        let train = all.slice(0, 140).unwrap();
        let validation = all.slice(140, 170).unwrap();
        let test = all.slice(170, 200).unwrap();

        let trained = ProphetModel::new(trend_only()).unwrap().train(&train, &validation).unwrap();
        let forecast = trained.forecast(test.timestamps()).unwrap();

        for (f, a) in forecast.values().iter().zip(test.values()) {
            assert_relative_eq!(*f, *a, max_relative = 1e-3);
        }
    }

    #[test]
    fn captures_weekly_pattern() {
        let pattern = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, -4.0];
        let values: Vec<f64> = (0..140).map(|i| 50.0 + pattern[i % 7]).collect();
        let all = daily(values);
        let train = all.slice(0, 98).unwrap();
        let validation = all.slice(98, 119).unwrap();
        let test = all.slice(119, 140).unwrap();

        let config = ProphetConfig {
            yearly_seasonality: false,
            ..Default::default()
        };
        let trained = ProphetModel::new(config).unwrap().train(&train, &validation).unwrap();
        let forecast = trained.forecast(test.timestamps()).unwrap();

        // Offset plus order 3 spans every pattern of period 7 on daily samples
        let mae: f64 = forecast
            .values()
            .iter()
            .zip(test.values())
            .map(|(f, a)| (f - a).abs())
            .sum::<f64>()
            / test.len() as f64;
        assert!(mae < 0.5, "mae = {}", mae);
    }

    #[test]
    fn changepoints_stay_in_first_part_of_history() {
        let all = daily((0..100).map(|i| i as f64).collect());
        let trained = ProphetModel::default()
            .train(&all.slice(0, 70).unwrap(), &all.slice(70, 85).unwrap())
            .unwrap();
        let cps = trained.changepoints();
        assert_eq!(cps.len(), 25);
        let limit = all.timestamps()[(85.0_f64 * 0.8) as usize];
        assert!(cps.iter().all(|c| *c <= limit));
    }

    #[test]
    fn weekly_seasonality_skipped_for_weekly_data() {
        let model = ProphetModel::default();
        let names: Vec<_> = model
            .seasonalities(Some(Duration::days(7)))
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["yearly"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ProphetConfig {
            changepoint_range: 1.5,
            ..Default::default()
        };
        assert!(ProphetModel::new(config).is_err());
    }
}
