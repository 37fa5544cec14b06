//! Load, clean, split, forecast and evaluate
//!
//! [`Pipeline::run`] drives one configured dataset through every selected
//! model family. The first failure aborts the run and is returned to the
//! caller; there are no partial reports.

use crate::config::{ModelKind, PipelineConfig};
use crate::data::{CleanedData, DataLoader, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, EvaluationMetrics};
use crate::models::{
    ArimaModel, ForecastModel, ForecastResult, LstmModel, ProphetModel, SarimaModel, TrainedForecastModel,
};
use crate::report;
use crate::split::ChronoSplit;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of one model family on the test partition
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub kind: ModelKind,
    /// Descriptive name including orders, e.g. `ARIMA(1,1,1)`
    pub model_name: String,
    pub forecast: ForecastResult,
    /// Test observations the forecast is scored against
    pub actual: Vec<f64>,
    pub metrics: EvaluationMetrics,
    /// Wall time spent training and forecasting
    pub fit_duration: Duration,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub dataset: PathBuf,
    pub target: String,
    /// Observations after cleaning
    pub observations: usize,
    /// Rows removed during cleaning
    pub dropped_rows: usize,
    /// `(train, validation, test)` lengths
    pub split_sizes: (usize, usize, usize),
    pub models: Vec<ModelReport>,
    /// Files written to the output directory
    pub artifacts: Vec<PathBuf>,
}

impl PipelineReport {
    /// Report of one model family, if it was run
    pub fn model(&self, kind: ModelKind) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.kind == kind)
    }

    /// Model with the lowest test RMSE
    pub fn best_by_rmse(&self) -> Option<&ModelReport> {
        self.models
            .iter()
            .min_by(|a, b| a.metrics.rmse.total_cmp(&b.metrics.rmse))
    }
}

/// Train `model` on the train/validation partitions, forecast the test
/// timestamps and score the forecast against the test values
pub fn evaluate_model<M: ForecastModel>(model: &M, split: &ChronoSplit) -> Result<(ForecastResult, EvaluationMetrics)> {
    debug!("Training {}", model.name());
    let trained = model.train(split.train(), split.validation())?;

    let test = split.test();
    let forecast = trained.forecast(test.timestamps())?;
    if forecast.len() != test.len() {
        return Err(ForecastError::ValidationError(format!(
            "{} produced {} values for a test partition of {}",
            trained.name(),
            forecast.len(),
            test.len()
        )));
    }

    let metrics = evaluate(forecast.values(), test.values())?;
    Ok((forecast, metrics))
}

/// A configured forecasting run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate the configuration and create the pipeline
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read and clean the configured dataset
    pub fn load_series(&self) -> Result<CleanedData> {
        debug!("Loading {}", self.config.data_path.display());
        let mut dataset = DataLoader::from_path(&self.config.data_path)?;
        dataset.normalize_column_names()?;
        debug!("Dataset summary:\n{}", dataset.summary()?);

        let cleaned = dataset.clean(&self.config.cleaning_spec())?;
        debug!(
            "Cleaned series '{}' has {} observations ({} rows dropped)",
            cleaned.target.name(),
            cleaned.target.len(),
            cleaned.dropped_rows
        );
        Ok(cleaned)
    }

    /// Run every configured model on the configured dataset
    pub fn run(&self) -> Result<PipelineReport> {
        let cleaned = self.load_series()?;
        self.run_on_series(&cleaned.target, cleaned.dropped_rows)
    }

    /// Run every configured model on an already cleaned series
    pub fn run_on_series(&self, series: &TimeSeries, dropped_rows: usize) -> Result<PipelineReport> {
        let split = ChronoSplit::new(series, self.config.split)?;
        let (train, validation, test) = split.sizes();
        debug!(
            "Split {} observations into train={}, validation={}, test={}",
            series.len(),
            train,
            validation,
            test
        );

        let mut models = Vec::with_capacity(self.config.models.len());
        for &kind in &self.config.models {
            let model_report = self.run_model(kind, &split)?;
            info!("{} metrics: {}", kind, model_report.metrics);
            debug!("{} finished in {:.2?}", model_report.model_name, model_report.fit_duration);
            models.push(model_report);
        }

        let mut report = PipelineReport {
            dataset: self.config.data_path.clone(),
            target: self.config.target_column.clone(),
            observations: series.len(),
            dropped_rows,
            split_sizes: split.sizes(),
            models,
            artifacts: Vec::new(),
        };

        if let Some(dir) = &self.config.output_dir {
            report.artifacts = report::write_report(&report, dir)?;
            debug!("Wrote {} artifacts to {}", report.artifacts.len(), dir.display());
        }

        Ok(report)
    }

    fn run_model(&self, kind: ModelKind, split: &ChronoSplit) -> Result<ModelReport> {
        let started = Instant::now();
        let (model_name, (forecast, metrics)) = match kind {
            ModelKind::Arima => {
                let model = ArimaModel::new(self.config.arima);
                (model.name().to_string(), evaluate_model(&model, split)?)
            }
            ModelKind::Sarima => {
                let model = SarimaModel::new(self.config.sarima.order, self.config.sarima.seasonal)?;
                (model.name().to_string(), evaluate_model(&model, split)?)
            }
            ModelKind::Prophet => {
                let model = ProphetModel::new(self.config.prophet.clone())?;
                (model.name().to_string(), evaluate_model(&model, split)?)
            }
            ModelKind::Lstm => {
                let model = LstmModel::new(self.config.lstm.clone())?;
                (model.name().to_string(), evaluate_model(&model, split)?)
            }
        };

        Ok(ModelReport {
            kind,
            model_name,
            forecast,
            actual: split.test().values().to_vec(),
            metrics,
            fit_duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trending(n: usize) -> TimeSeries {
        let values = (0..n).map(|i| 100.0 + 0.8 * i as f64 + (i as f64 * 0.5).sin()).collect();
        TimeSeries::daily("close", NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn evaluate_model_scores_test_partition() {
        let series = trending(100);
        let split = ChronoSplit::new(&series, Default::default()).unwrap();
        let (forecast, metrics) = evaluate_model(&ArimaModel::default(), &split).unwrap();

        assert_eq!(forecast.len(), 15);
        assert_eq!(forecast.timestamps(), split.test().timestamps());
        assert!(metrics.rmse >= 0.0);
        assert!(metrics.r2 <= 1.0);
    }

    #[test]
    fn runs_selected_models_in_order() {
        let config = PipelineConfig::new("unused.csv", "close")
            .with_models(vec![ModelKind::Prophet, ModelKind::Arima]);
        let report = Pipeline::new(config).unwrap().run_on_series(&trending(150), 0).unwrap();

        let kinds: Vec<_> = report.models.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![ModelKind::Prophet, ModelKind::Arima]);
        assert_eq!(report.split_sizes, (105, 22, 23));
        assert!(report.model(ModelKind::Lstm).is_none());
        assert!(report.best_by_rmse().is_some());
        assert!(report.artifacts.is_empty());
    }

    #[test]
    fn first_failure_aborts_the_run() {
        // 50 points leave 35 for training, below the LSTM sequence length
        let config = PipelineConfig::new("unused.csv", "close")
            .with_models(vec![ModelKind::Arima, ModelKind::Lstm]);
        let err = Pipeline::new(config).unwrap().run_on_series(&trending(50), 0).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig::new("unused.csv", "close").with_models(Vec::new());
        assert!(Pipeline::new(config).is_err());
    }
}
