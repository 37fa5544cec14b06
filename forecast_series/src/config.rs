//! Pipeline configuration
//!
//! A [`PipelineConfig`] names the dataset, the columns to use and how to
//! repair them, the split ratios, which model families to run and their
//! parameters. Configurations are plain JSON documents; the three bundled
//! presets describe the gold, real estate and stock index datasets.

use crate::data::{default_synthetic_start, default_target_fill, CleaningSpec, ColumnRule, FillStrategy};
use crate::error::{ForecastError, Result};
use crate::models::{ArimaOrder, LstmConfig, ProphetConfig, SeasonalOrder};
use crate::split::SplitRatios;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Model families the pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Arima,
    Sarima,
    Prophet,
    Lstm,
}

impl ModelKind {
    /// All families in reporting order
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Arima,
        ModelKind::Sarima,
        ModelKind::Prophet,
        ModelKind::Lstm,
    ];

    /// Lower-case identifier used in file names and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Arima => "arima",
            ModelKind::Sarima => "sarima",
            ModelKind::Prophet => "prophet",
            ModelKind::Lstm => "lstm",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelKind::Arima => "ARIMA",
            ModelKind::Sarima => "SARIMA",
            ModelKind::Prophet => "Prophet",
            ModelKind::Lstm => "LSTM",
        })
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arima" => Ok(ModelKind::Arima),
            "sarima" => Ok(ModelKind::Sarima),
            "prophet" => Ok(ModelKind::Prophet),
            "lstm" => Ok(ModelKind::Lstm),
            other => Err(ForecastError::ConfigError(format!(
                "Unknown model '{}', expected one of arima, sarima, prophet, lstm",
                other
            ))),
        }
    }
}

/// Bundled dataset descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Daily gold prices
    Gold,
    /// Egyptian house listings without a date column
    RealEstate,
    /// EGX100 stock index closes
    StockIndex,
}

impl FromStr for Preset {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "gold" => Ok(Preset::Gold),
            "real-estate" => Ok(Preset::RealEstate),
            "stock-index" | "stock" => Ok(Preset::StockIndex),
            other => Err(ForecastError::ConfigError(format!(
                "Unknown preset '{}', expected gold, real-estate or stock-index",
                other
            ))),
        }
    }
}

/// Order of the seasonal model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SarimaConfig {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
}

fn default_models() -> Vec<ModelKind> {
    ModelKind::ALL.to_vec()
}

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// CSV, parquet or Excel workbook to read
    pub data_path: PathBuf,
    /// Column to forecast
    pub target_column: String,
    /// Column holding observation dates
    #[serde(default)]
    pub date_column: Option<String>,
    /// Extra numeric columns to coerce and fill
    #[serde(default)]
    pub numeric_columns: Vec<ColumnRule>,
    #[serde(default = "default_target_fill")]
    pub target_fill: FillStrategy,
    /// First synthetic date when there is no date column
    #[serde(default = "default_synthetic_start")]
    pub synthetic_start: NaiveDate,
    #[serde(default)]
    pub split: SplitRatios,
    /// Model families to run, in order
    #[serde(default = "default_models")]
    pub models: Vec<ModelKind>,
    #[serde(default)]
    pub arima: ArimaOrder,
    #[serde(default)]
    pub sarima: SarimaConfig,
    #[serde(default)]
    pub prophet: ProphetConfig,
    #[serde(default)]
    pub lstm: LstmConfig,
    /// Directory for forecast CSVs and the metrics document
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Configuration with defaults for everything but the data source
    pub fn new(data_path: impl Into<PathBuf>, target_column: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            target_column: target_column.into(),
            date_column: None,
            numeric_columns: Vec::new(),
            target_fill: default_target_fill(),
            synthetic_start: default_synthetic_start(),
            split: SplitRatios::default(),
            models: default_models(),
            arima: ArimaOrder::default(),
            sarima: SarimaConfig::default(),
            prophet: ProphetConfig::default(),
            lstm: LstmConfig::default(),
            output_dir: None,
        }
    }

    /// Configuration for a bundled dataset, read from the working directory
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Gold => {
                Self::new("./data.csv", "24K - Global Price").with_date_column("Date")
            }
            Preset::RealEstate => {
                let mut config = Self::new("./egypt_House_prices.csv", "Price");
                config.target_fill = FillStrategy::Mean;
                config.numeric_columns = vec![
                    ColumnRule::new("Bedrooms", FillStrategy::Median),
                    ColumnRule::new("Bathrooms", FillStrategy::Median),
                    ColumnRule::new("Area", FillStrategy::Mean),
                ];
                config
            }
            Preset::StockIndex => {
                Self::new("./EGX100_20090802_20190827.xls", "INDEXCLOSE").with_date_column("INDEXDATE")
            }
        }
    }

    pub fn with_date_column(mut self, date_column: impl Into<String>) -> Self {
        self.date_column = Some(date_column.into());
        self
    }

    pub fn with_models(mut self, models: Vec<ModelKind>) -> Self {
        self.models = models;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Read a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the pipeline cannot run
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(ForecastError::ConfigError(
                "Target column must not be empty".to_string(),
            ));
        }
        if matches!(&self.date_column, Some(col) if col.trim().is_empty()) {
            return Err(ForecastError::ConfigError(
                "Date column must not be empty when given".to_string(),
            ));
        }
        if self.models.is_empty() {
            return Err(ForecastError::ConfigError(
                "At least one model must be selected".to_string(),
            ));
        }
        self.split.validate()?;
        if self.sarima.seasonal.period < 2 {
            return Err(ForecastError::ConfigError(format!(
                "Seasonal period must be at least 2, got {}",
                self.sarima.seasonal.period
            )));
        }
        self.prophet.validate()?;
        self.lstm.validate()?;
        Ok(())
    }

    /// Cleaning instructions derived from this configuration
    pub fn cleaning_spec(&self) -> CleaningSpec {
        CleaningSpec {
            target_column: self.target_column.clone(),
            date_column: self.date_column.clone(),
            target_fill: self.target_fill,
            numeric_columns: self.numeric_columns.clone(),
            synthetic_start: self.synthetic_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("arima", ModelKind::Arima)]
    #[case("SARIMA", ModelKind::Sarima)]
    #[case(" prophet ", ModelKind::Prophet)]
    #[case("Lstm", ModelKind::Lstm)]
    fn parses_model_names(#[case] input: &str, #[case] expected: ModelKind) {
        assert_eq!(input.parse::<ModelKind>().unwrap(), expected);
    }

    #[test]
    fn unknown_model_is_a_config_error() {
        assert!(matches!("xgboost".parse::<ModelKind>(), Err(ForecastError::ConfigError(_))));
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"data_path": "prices.csv", "target_column": "Close"}"#).unwrap();
        assert_eq!(config, PipelineConfig::new("prices.csv", "Close"));
        assert_eq!(config.models, ModelKind::ALL.to_vec());
        assert_eq!(config.lstm.sequence_length, 60);
        assert_eq!(config.sarima.seasonal.period, 12);
    }

    #[rstest]
    #[case(Preset::Gold)]
    #[case(Preset::RealEstate)]
    #[case(Preset::StockIndex)]
    fn presets_survive_json_round_trip(#[case] preset: Preset) {
        let config = PipelineConfig::from_preset(preset);
        config.validate().unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn real_estate_preset_uses_synthetic_dates() {
        let spec = PipelineConfig::from_preset(Preset::RealEstate).cleaning_spec();
        assert_eq!(spec.date_column, None);
        assert_eq!(spec.target_fill, FillStrategy::Mean);
        assert_eq!(spec.synthetic_start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(spec.numeric_columns.len(), 3);
    }

    #[test]
    fn stock_index_preset_reads_the_workbook() {
        let config = PipelineConfig::from_preset(Preset::StockIndex);
        assert_eq!(config.data_path, PathBuf::from("./EGX100_20090802_20190827.xls"));
        assert_eq!(config.cleaning_spec().date_column.as_deref(), Some("INDEXDATE"));
    }

    #[test]
    fn partial_model_orders_keep_remaining_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"data_path": "x.csv", "target_column": "y", "arima": {"p": 2}, "sarima": {"seasonal": {"period": 7}}}"#,
        )
        .unwrap();
        assert_eq!(config.arima, ArimaOrder::new(2, 1, 1));
        assert_eq!(config.sarima.seasonal, SeasonalOrder::new(1, 1, 1, 7));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("real_estate".parse::<Preset>().unwrap(), Preset::RealEstate);
        assert_eq!("stock-index".parse::<Preset>().unwrap(), Preset::StockIndex);
        assert!("silver".parse::<Preset>().is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = PipelineConfig::new("x.csv", " ");
        assert!(config.validate().is_err());

        config.target_column = "Close".to_string();
        config.lstm.sequence_length = 0;
        assert!(config.validate().is_err());

        config.lstm = LstmConfig::default();
        config.sarima.seasonal.period = 1;
        assert!(config.validate().is_err());

        config.sarima = SarimaConfig::default();
        config.models.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"data_path": "d.csv", "target_column": "y", "models": ["arima", "lstm"], "lstm": {"epochs": 3}}"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.models, vec![ModelKind::Arima, ModelKind::Lstm]);
        assert_eq!(config.lstm.epochs, 3);
        assert_eq!(config.lstm.hidden_sizes, vec![50, 50]);
    }
}
