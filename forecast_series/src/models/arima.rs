//! ARIMA models for time series forecasting
//!
//! Parameters are estimated by minimizing the conditional sum of squares
//! (CSS) of the one-step residuals with a Nelder-Mead search. The same
//! estimator serves the seasonal variant: seasonal AR/MA factors are
//! multiplied into the lag polynomials before the recursion runs.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::sarima::SeasonalOrder;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use series_math::differencing::polymul;
use series_math::optimization::{nelder_mead, NelderMeadConfig};
use series_math::{stats, DifferencingPolynomial};
use tracing::debug;

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Coefficient bound that keeps the estimated factors stationary and invertible
const COEFFICIENT_BOUND: f64 = 0.99;

/// Default coverage of the prediction intervals
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// CSS estimator shared by ARIMA and SARIMA
#[derive(Debug, Clone)]
pub(crate) struct CssEstimator {
    pub(crate) name: String,
    pub(crate) order: ArimaOrder,
    pub(crate) seasonal: Option<SeasonalOrder>,
    pub(crate) confidence_level: f64,
}

/// Estimated coefficients in factored form
#[derive(Debug, Clone)]
struct Coefficients {
    intercept: f64,
    ar: Vec<f64>,
    seasonal_ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    fn unpack(params: &[f64], layout: &Layout) -> Self {
        let mut rest = params;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        let intercept = if layout.intercept { take(1)[0] } else { 0.0 };
        Self {
            intercept,
            ar: take(layout.p),
            seasonal_ar: take(layout.seasonal_p),
            ma: take(layout.q),
            seasonal_ma: take(layout.seasonal_q),
        }
    }

    /// Expanded AR coefficients `a_k` of `w_t = sum a_k w_{t-k} + ...`
    fn expanded_ar(&self, period: usize) -> Vec<f64> {
        let regular = lag_polynomial(&self.ar, 1, -1.0);
        let seasonal = lag_polynomial(&self.seasonal_ar, period, -1.0);
        polymul(&regular, &seasonal)[1..].iter().map(|c| -c).collect()
    }

    /// Expanded MA coefficients `m_k` of `... + sum m_k e_{t-k}`
    fn expanded_ma(&self, period: usize) -> Vec<f64> {
        let regular = lag_polynomial(&self.ma, 1, 1.0);
        let seasonal = lag_polynomial(&self.seasonal_ma, period, 1.0);
        polymul(&regular, &seasonal)[1..].to_vec()
    }
}

/// `1 + sign * (c_1 B^step + c_2 B^(2 step) + ...)`
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    intercept: bool,
    p: usize,
    seasonal_p: usize,
    q: usize,
    seasonal_q: usize,
}

impl Layout {
    fn len(&self) -> usize {
        usize::from(self.intercept) + self.p + self.seasonal_p + self.q + self.seasonal_q
    }
}

/// Run the ARMA recursion over `w`, returning one-step predictions and residuals.
/// The first `start` residuals are conditioned to zero.
fn recursion(w: &[f64], ar: &[f64], ma: &[f64], mean: f64, start: usize) -> (Vec<f64>, Vec<f64>) {
    let mut predictions = vec![mean; w.len()];
    let mut residuals = vec![0.0; w.len()];

    for t in start..w.len() {
        let mut pred = mean;
        for (k, a) in ar.iter().enumerate() {
            pred += a * (w[t - 1 - k] - mean);
        }
        for (k, m) in ma.iter().enumerate() {
            pred += m * residuals[t - 1 - k];
        }
        predictions[t] = pred;
        residuals[t] = w[t] - pred;
    }

    (predictions, residuals)
}

impl CssEstimator {
    fn period(&self) -> usize {
        self.seasonal.map(|s| s.period).unwrap_or(1)
    }

    fn differencing(&self) -> Result<DifferencingPolynomial> {
        let (seasonal_d, period) = match self.seasonal {
            Some(s) => (s.d, s.period),
            None => (0, 1),
        };
        Ok(DifferencingPolynomial::new(self.order.d, seasonal_d, period)?)
    }

    fn layout(&self) -> Layout {
        let seasonal = self.seasonal.unwrap_or_default();
        let differenced = self.order.d > 0 || seasonal.d > 0;
        Layout {
            intercept: !differenced,
            p: self.order.p,
            seasonal_p: if self.seasonal.is_some() { seasonal.p } else { 0 },
            q: self.order.q,
            seasonal_q: if self.seasonal.is_some() { seasonal.q } else { 0 },
        }
    }

    /// Estimate on `train`, then filter through `validation` so the state is
    /// current at the forecast origin
    pub(crate) fn fit(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<TrainedArimaModel> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }

        let period = self.period();
        let layout = self.layout();
        let poly = self.differencing()?;
        let max_ar = layout.p + layout.seasonal_p * period;
        let max_ma = layout.q + layout.seasonal_q * period;
        let start = max_ar.max(max_ma);

        let needed = poly.order() + start + layout.len() + 2;
        if train.len() < needed {
            return Err(ForecastError::insufficient(
                needed,
                train.len(),
                format!("{} training observations", self.name),
            ));
        }

        let w_train = poly.apply(train.values())?;

        // Estimate on a standardized copy; AR/MA coefficients are scale free
        let scale = match stats::population_std_dev(&w_train)? {
            s if s > 0.0 && s.is_finite() => s,
            _ => 1.0,
        };
        let w_scaled: Vec<f64> = w_train.iter().map(|v| v / scale).collect();
        let mean_scaled = stats::mean(&w_scaled)?;

        let mut initial = Vec::with_capacity(layout.len());
        let mut bounds = Vec::with_capacity(layout.len());
        if layout.intercept {
            initial.push(mean_scaled);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for count in [layout.p, layout.seasonal_p, layout.q, layout.seasonal_q] {
            for i in 0..count {
                initial.push(0.1 / (i + 1) as f64);
                bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
            }
        }

        let objective = |params: &[f64]| {
            let c = Coefficients::unpack(params, &layout);
            let (_, residuals) = recursion(
                &w_scaled,
                &c.expanded_ar(period),
                &c.expanded_ma(period),
                c.intercept,
                start,
            );
            residuals[start..].iter().map(|e| e * e).sum::<f64>()
        };

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let result = nelder_mead(objective, &initial, Some(&bounds), &config);
        if !result.value.is_finite() || result.value == f64::MAX {
            return Err(ForecastError::model_fit(
                &self.name,
                "conditional sum of squares did not produce a finite value",
            ));
        }
        debug!(
            "{} estimation finished after {} iterations (converged: {}, CSS {:.6})",
            self.name, result.iterations, result.converged, result.value
        );

        let mut coefficients = Coefficients::unpack(&result.point, &layout);
        coefficients.intercept *= scale;
        let ar = coefficients.expanded_ar(period);
        let ma = coefficients.expanded_ma(period);

        let (_, train_residuals) = recursion(&w_train, &ar, &ma, coefficients.intercept, start);
        let effective = &train_residuals[start..];
        let sigma2 = effective.iter().map(|e| e * e).sum::<f64>() / effective.len() as f64;

        // Bring residuals up to date through the validation period
        let history = train.concat(validation)?;
        let w_history = poly.apply(history.values())?;
        let (_, residuals) = recursion(&w_history, &ar, &ma, coefficients.intercept, start);

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            intercept: coefficients.intercept,
            ar_coefficients: coefficients.ar,
            ma_coefficients: coefficients.ma,
            seasonal_ar_coefficients: coefficients.seasonal_ar,
            seasonal_ma_coefficients: coefficients.seasonal_ma,
            expanded_ar: ar,
            expanded_ma: ma,
            differencing: poly,
            history: history.values().to_vec(),
            differenced: w_history,
            residuals,
            sigma2,
            confidence_level: self.confidence_level,
        })
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    estimator: CssEstimator,
}

impl ArimaModel {
    /// Create a new ARIMA(p, d, q) model
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            estimator: CssEstimator {
                name: format!("ARIMA({},{},{})", order.p, order.d, order.q),
                order,
                seasonal: None,
                confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            },
        }
    }

    /// Coverage of the prediction intervals
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.estimator.confidence_level = level;
        self
    }

    /// The model order
    pub fn order(&self) -> ArimaOrder {
        self.estimator.order
    }
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new(ArimaOrder::default())
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, train: &TimeSeries, validation: &TimeSeries) -> Result<TrainedArimaModel> {
        self.estimator.fit(train, validation)
    }

    fn name(&self) -> &str {
        &self.estimator.name
    }
}

/// Trained ARIMA or SARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    name: String,
    intercept: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    seasonal_ar_coefficients: Vec<f64>,
    seasonal_ma_coefficients: Vec<f64>,
    expanded_ar: Vec<f64>,
    expanded_ma: Vec<f64>,
    differencing: DifferencingPolynomial,
    /// Observations up to the forecast origin
    history: Vec<f64>,
    /// Differenced history
    differenced: Vec<f64>,
    /// One-step residuals of the differenced history
    residuals: Vec<f64>,
    /// Residual variance on the training period
    sigma2: f64,
    confidence_level: f64,
}

impl TrainedArimaModel {
    /// Fitted non-seasonal AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Fitted non-seasonal MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Fitted seasonal AR coefficients
    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    /// Fitted seasonal MA coefficients
    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    /// Intercept of the differenced process (zero when differenced)
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Residual variance on the training period
    pub fn residual_variance(&self) -> f64 {
        self.sigma2
    }

    /// Psi weights of the integrated process, used for interval widths
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let ar_poly: Vec<f64> = std::iter::once(1.0)
            .chain(self.expanded_ar.iter().map(|a| -a))
            .collect();
        let full_ar = polymul(&ar_poly, self.differencing.coefficients());

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = self.expanded_ma.get(j - 1).copied().unwrap_or(0.0);
            for k in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, timestamps: &[DateTime<Utc>]) -> Result<ForecastResult> {
        let horizon = timestamps.len();
        let mut w = self.differenced.clone();
        let mut residuals = self.residuals.clone();

        for _ in 0..horizon {
            let t = w.len();
            let mut pred = self.intercept;
            for (k, a) in self.expanded_ar.iter().enumerate() {
                if t > k {
                    pred += a * (w[t - 1 - k] - self.intercept);
                }
            }
            for (k, m) in self.expanded_ma.iter().enumerate() {
                if t > k {
                    pred += m * residuals[t - 1 - k];
                }
            }
            w.push(pred);
            residuals.push(0.0);
        }

        let forecast_diff = &w[self.differenced.len()..];
        let values = self.differencing.integrate(&self.history, forecast_diff)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::model_fit(
                &self.name,
                "forecast diverged to non-finite values",
            ));
        }

        let z = stats::normal_critical_value(self.confidence_level)?;
        let mut cumulative = 0.0;
        let intervals = self
            .psi_weights(horizon)
            .iter()
            .zip(values.iter())
            .map(|(psi, v)| {
                cumulative += psi * psi;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (v - half_width, v + half_width)
            })
            .collect();

        ForecastResult::new_with_intervals(values, timestamps.to_vec(), intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
