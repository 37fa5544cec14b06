//! Forecast CLI
//!
//! Runs the train / validate / test pipeline on one dataset.
//!
//! Usage:
//!   forecast --preset gold
//!   forecast --data prices.csv --target Close --date Date --models arima,prophet
//!   forecast --config run.json --output reports -v

use clap::{ArgAction, Parser};
use forecast_series::{ModelKind, Pipeline, PipelineConfig, Preset};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "forecast", version, about = "Evaluate forecasting models on a time series dataset")]
struct Cli {
    /// JSON pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bundled dataset description: gold, real-estate or stock-index
    #[arg(long, value_parser = parse_preset)]
    preset: Option<Preset>,

    /// CSV or parquet file to read
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Column to forecast
    #[arg(long, value_name = "COL")]
    target: Option<String>,

    /// Column holding observation dates
    #[arg(long, value_name = "COL")]
    date: Option<String>,

    /// Comma separated model families to run
    #[arg(long, value_delimiter = ',', value_parser = parse_model)]
    models: Vec<ModelKind>,

    /// Directory for forecast CSVs and metrics.json
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_preset(s: &str) -> Result<Preset, String> {
    s.parse().map_err(|e: forecast_series::ForecastError| e.to_string())
}

fn parse_model(s: &str) -> Result<ModelKind, String> {
    s.parse().map_err(|e: forecast_series::ForecastError| e.to_string())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = if let Some(path) = &cli.config {
        PipelineConfig::load(path)?
    } else if let Some(preset) = cli.preset {
        PipelineConfig::from_preset(preset)
    } else {
        match (&cli.data, &cli.target) {
            (Some(data), Some(target)) => PipelineConfig::new(data, target),
            _ => return Err("either --config, --preset or both --data and --target are required".into()),
        }
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(target) = &cli.target {
        config.target_column = target.clone();
    }
    if let Some(date) = &cli.date {
        config.date_column = Some(date.clone());
    }
    if !cli.models.is_empty() {
        config.models = cli.models.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = Some(output.clone());
    }

    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(cli)?;
    let report = Pipeline::new(config)?.run()?;

    if let Some(best) = report.best_by_rmse() {
        info!("Lowest test RMSE: {} ({:.4})", best.model_name, best.metrics.rmse);
    }
    for path in &report.artifacts {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
    Ok(())
}
