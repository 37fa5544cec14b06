//! Forecast artifacts
//!
//! One `<model>_forecast.csv` per model with the test timestamps, the actual
//! values, the forecast and its interval bounds, plus a `metrics.json`
//! document summarizing the run.

use crate::error::{ForecastError, Result};
use crate::metrics::EvaluationMetrics;
use crate::pipeline::{ModelReport, PipelineReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ForecastRow {
    timestamp: DateTime<Utc>,
    actual: f64,
    forecast: f64,
    lower: Option<f64>,
    upper: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SplitSizes {
    train: usize,
    validation: usize,
    test: usize,
}

#[derive(Debug, Serialize)]
struct ModelMetrics<'a> {
    model: &'a str,
    name: &'a str,
    metrics: &'a EvaluationMetrics,
    fit_seconds: f64,
}

#[derive(Debug, Serialize)]
struct MetricsDocument<'a> {
    dataset: &'a Path,
    target: &'a str,
    observations: usize,
    dropped_rows: usize,
    split: SplitSizes,
    models: Vec<ModelMetrics<'a>>,
}

/// Write a model's forecast next to the actual test values
pub fn write_forecast_csv<P: AsRef<Path>>(path: P, model: &ModelReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let intervals = model.forecast.intervals();

    for (idx, (timestamp, forecast)) in model
        .forecast
        .timestamps()
        .iter()
        .zip(model.forecast.values())
        .enumerate()
    {
        let bounds = intervals.map(|iv| iv[idx]);
        writer.serialize(ForecastRow {
            timestamp: *timestamp,
            actual: model.actual[idx],
            forecast: *forecast,
            lower: bounds.map(|b| b.0),
            upper: bounds.map(|b| b.1),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the run summary as pretty JSON
pub fn write_metrics_json<P: AsRef<Path>>(path: P, report: &PipelineReport) -> Result<()> {
    let (train, validation, test) = report.split_sizes;
    let document = MetricsDocument {
        dataset: &report.dataset,
        target: &report.target,
        observations: report.observations,
        dropped_rows: report.dropped_rows,
        split: SplitSizes {
            train,
            validation,
            test,
        },
        models: report
            .models
            .iter()
            .map(|m| ModelMetrics {
                model: m.kind.as_str(),
                name: &m.model_name,
                metrics: &m.metrics,
                fit_seconds: m.fit_duration.as_secs_f64(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| ForecastError::ReportError(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

/// Write all artifacts of a run into `dir`, creating it if needed.
/// Returns the written paths.
pub fn write_report<P: AsRef<Path>>(report: &PipelineReport, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(report.models.len() + 1);
    for model in &report.models {
        let path = dir.join(format!("{}_forecast.csv", model.kind.as_str()));
        write_forecast_csv(&path, model)?;
        written.push(path);
    }

    let metrics_path = dir.join("metrics.json");
    write_metrics_json(&metrics_path, report)?;
    written.push(metrics_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelKind;
    use crate::metrics::evaluate;
    use crate::models::ForecastResult;
    use chrono::TimeZone;

    fn sample_report() -> PipelineReport {
        let timestamps: Vec<_> = (1..=3)
            .map(|d| Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap())
            .collect();
        let actual = vec![10.0, 11.0, 12.0];
        let forecast = ForecastResult::new_with_intervals(
            vec![10.5, 11.0, 11.0],
            timestamps,
            vec![(9.0, 12.0), (9.5, 12.5), (9.0, 13.0)],
        )
        .unwrap();
        let metrics = evaluate(forecast.values(), &actual).unwrap();

        PipelineReport {
            dataset: PathBuf::from("prices.csv"),
            target: "close".to_string(),
            observations: 20,
            dropped_rows: 1,
            split_sizes: (14, 3, 3),
            models: vec![ModelReport {
                kind: ModelKind::Arima,
                model_name: "ARIMA(1,1,1)".to_string(),
                forecast,
                actual,
                metrics,
                fit_duration: std::time::Duration::from_millis(250),
            }],
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn writes_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let written = write_report(&sample_report(), &out).unwrap();

        assert_eq!(written, vec![out.join("arima_forecast.csv"), out.join("metrics.json")]);

        let csv_text = fs::read_to_string(out.join("arima_forecast.csv")).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("timestamp,actual,forecast,lower,upper"));
        assert_eq!(lines.next(), Some("2024-05-01T00:00:00Z,10.0,10.5,9.0,12.0"));
        assert_eq!(csv_text.lines().count(), 4);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("metrics.json")).unwrap()).unwrap();
        assert_eq!(json["split"]["test"], 3);
        assert_eq!(json["models"][0]["model"], "arima");
        assert_eq!(json["models"][0]["name"], "ARIMA(1,1,1)");
        assert!(json["models"][0]["metrics"]["rmse"].as_f64().unwrap() > 0.0);
        assert_eq!(json["models"][0]["fit_seconds"], 0.25);
    }
}
