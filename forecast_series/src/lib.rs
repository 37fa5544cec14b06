//! # Forecast Series
//!
//! A Rust library for evaluating forecasting models on financial time series.
//!
//! ## Features
//!
//! - Tabular ingestion (CSV, parquet) with column-name normalization and cleaning
//! - Chronological train / validation / test splitting
//! - Forecasting models (ARIMA, SARIMA, Prophet-style decomposition, LSTM)
//! - Accuracy metrics (MAE, MSE, RMSE, R^2, MAPE)
//! - A configurable pipeline with JSON configuration and bundled dataset presets
//! - Forecast CSV and metrics JSON artifacts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forecast_series::{ModelKind, Pipeline, PipelineConfig, Preset};
//!
//! // Daily gold prices from ./data.csv
//! let config = PipelineConfig::from_preset(Preset::Gold)
//!     .with_models(vec![ModelKind::Arima, ModelKind::Prophet])
//!     .with_output_dir("reports");
//!
//! let report = Pipeline::new(config)?.run()?;
//! for model in &report.models {
//!     println!("{} metrics: {}", model.kind, model.metrics);
//! }
//! # Ok::<(), forecast_series::ForecastError>(())
//! ```
//!
//! Models can also be used directly on a [`TimeSeries`]:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use forecast_series::models::{ArimaModel, ForecastModel, TrainedForecastModel};
//! use forecast_series::{ChronoSplit, SplitRatios, TimeSeries};
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let values = (0..60).map(|i| 100.0 + i as f64 + (i as f64).sin()).collect();
//! let series = TimeSeries::daily("price", start, values)?;
//!
//! let split = ChronoSplit::new(&series, SplitRatios::default())?;
//! let trained = ArimaModel::default().train(split.train(), split.validation())?;
//! let forecast = trained.forecast(split.test().timestamps())?;
//! assert_eq!(forecast.len(), split.test().len());
//! # Ok::<(), forecast_series::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod split;

// Re-export commonly used types
pub use crate::config::{ModelKind, PipelineConfig, Preset, SarimaConfig};
pub use crate::data::{CleaningSpec, ColumnRule, DataLoader, Dataset, FillStrategy, TimeSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{evaluate, EvaluationMetrics};
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{evaluate_model, ModelReport, Pipeline, PipelineReport};
pub use crate::split::{ChronoSplit, SplitRatios};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
