//! Time series data handling for forecasting
//!
//! Raw tables are loaded into a polars `DataFrame` and wrapped in a
//! [`Dataset`]. Cleaning turns a dataset into a [`TimeSeries`]: one numeric
//! target indexed by strictly increasing UTC timestamps, with no gaps.

use crate::error::{ForecastError, Result};
use calamine::{open_workbook_auto, DataType as CellValue, Reader};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use series_math::{interpolate_linear, stats};
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Ordered (timestamp, value) pairs
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series, checking that timestamps strictly increase and values are finite
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::ValidationError(format!(
                "Timestamps must strictly increase (position {})",
                i + 1
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ValidationError(format!(
                "Value at position {} is missing or not finite",
                i
            )));
        }

        Ok(Self {
            name: name.into(),
            timestamps,
            values,
        })
    }

    /// Create a daily series starting at `start` (handy for synthetic data)
    pub fn daily(name: impl Into<String>, start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let origin = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
        let timestamps = (0..values.len())
            .map(|i| origin + Duration::days(i as i64))
            .collect();
        Self::new(name, timestamps, values)
    }

    /// Name of the series (the target column)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Timestamps, strictly increasing
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Observed values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sub-series over positions `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(ForecastError::ValidationError(format!(
                "Invalid slice {}..{} of a series with {} observations",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self {
            name: self.name.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Append `other`, which must start after this series ends
    pub fn concat(&self, other: &TimeSeries) -> Result<Self> {
        let mut timestamps = self.timestamps.clone();
        timestamps.extend_from_slice(&other.timestamps);
        let mut values = self.values.clone();
        values.extend_from_slice(&other.values);
        Self::new(self.name.clone(), timestamps, values)
    }

    /// Median spacing between consecutive timestamps
    pub fn typical_step(&self) -> Option<Duration> {
        let mut steps: Vec<i64> = self
            .timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds())
            .collect();
        if steps.is_empty() {
            return None;
        }
        steps.sort_unstable();
        Some(Duration::seconds(steps[steps.len() / 2]))
    }
}

/// How missing values of a column are filled during cleaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Replace with the column mean
    Mean,
    /// Replace with the column median
    Median,
    /// Linear interpolation over the time axis
    Interpolate,
    /// Drop the whole row
    Drop,
}

/// A numeric column to coerce and fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub name: String,
    pub fill: FillStrategy,
}

impl ColumnRule {
    pub fn new(name: impl Into<String>, fill: FillStrategy) -> Self {
        Self {
            name: name.into(),
            fill,
        }
    }
}

/// Which columns to use and how to repair them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSpec {
    /// Column holding the series to forecast
    pub target_column: String,
    /// Column holding observation dates; rows get synthetic daily dates when absent
    #[serde(default)]
    pub date_column: Option<String>,
    /// Fill strategy for the target
    #[serde(default = "default_target_fill")]
    pub target_fill: FillStrategy,
    /// Additional numeric columns to coerce and fill
    #[serde(default)]
    pub numeric_columns: Vec<ColumnRule>,
    /// First synthetic date when there is no date column
    #[serde(default = "default_synthetic_start")]
    pub synthetic_start: NaiveDate,
}

pub(crate) fn default_target_fill() -> FillStrategy {
    FillStrategy::Interpolate
}

pub(crate) fn default_synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default()
}

impl CleaningSpec {
    /// Target with interpolation, no date column, no extra columns
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            date_column: None,
            target_fill: default_target_fill(),
            numeric_columns: Vec::new(),
            synthetic_start: default_synthetic_start(),
        }
    }

    pub fn with_date_column(mut self, date_column: impl Into<String>) -> Self {
        self.date_column = Some(date_column.into());
        self
    }

    pub fn with_target_fill(mut self, fill: FillStrategy) -> Self {
        self.target_fill = fill;
        self
    }

    pub fn with_numeric_column(mut self, rule: ColumnRule) -> Self {
        self.numeric_columns.push(rule);
        self
    }
}

/// Output of cleaning: the target series plus the repaired auxiliary columns
#[derive(Debug, Clone)]
pub struct CleanedData {
    /// Target series
    pub target: TimeSeries,
    /// Auxiliary numeric columns aligned with the target
    pub covariates: Vec<(String, Vec<f64>)>,
    /// Rows removed during cleaning
    pub dropped_rows: usize,
}

/// A loaded table
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

/// Data loader for tabular files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset, choosing the reader by file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Self::from_csv(path),
            Some("parquet") => Self::from_parquet(path),
            Some("xls") | Some("xlsx") => Self::from_excel(path),
            other => Err(ForecastError::DataShape(format!(
                "Unsupported dataset format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Load a dataset from a CSV file with a header row.
    ///
    /// Every column is read as text; [`Dataset::clean`] coerces the declared
    /// columns, so a stray token deep in the file only yields a missing value.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(Some(0))
            .has_header(true)
            .finish()?;

        debug!(
            "CSV data loaded: {} rows, {} columns",
            df.height(),
            df.width()
        );
        Self::from_dataframe(df)
    }

    /// Load a dataset from a parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let file = File::open(path.as_ref())?;
        let df = ParquetReader::new(file).finish()?;

        debug!(
            "Parquet data loaded: {} rows, {} columns",
            df.height(),
            df.width()
        );
        Self::from_dataframe(df)
    }

    /// Load the first worksheet of an Excel workbook (`.xls` or `.xlsx`).
    ///
    /// The first row holds the column names. Cells are read as text, dates
    /// as `%Y-%m-%d %H:%M:%S`, so cleaning coerces them like CSV input.
    pub fn from_excel<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        // Missing files are I/O errors
        File::open(path)?;

        let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
        let sheet = workbook.sheet_names().first().cloned().ok_or_else(|| {
            ForecastError::DataShape(format!("Workbook {} has no worksheets", path.display()))
        })?;
        let range = workbook
            .worksheet_range(&sheet)
            .ok_or_else(|| {
                ForecastError::DataShape(format!(
                    "Worksheet '{}' not found in {}",
                    sheet,
                    path.display()
                ))
            })?
            .map_err(|e| workbook_error(path, e))?;

        let df = dataframe_from_range(&range)?;
        debug!(
            "Excel data loaded from sheet '{}': {} rows, {} columns",
            sheet,
            df.height(),
            df.width()
        );
        Self::from_dataframe(df)
    }

    /// Wrap an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<Dataset> {
        if df.width() == 0 {
            return Err(ForecastError::DataShape(
                "Dataset has no columns".to_string(),
            ));
        }
        Ok(Dataset { df })
    }
}

impl Dataset {
    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Trim surrounding whitespace from every column name
    pub fn normalize_column_names(&mut self) -> Result<()> {
        let trimmed: Vec<String> = self
            .column_names()
            .iter()
            .map(|n| n.trim().to_string())
            .collect();
        self.df.set_column_names(&trimmed)?;
        Ok(())
    }

    fn require_column(&self, name: &str) -> Result<&Series> {
        self.df.column(name).map_err(|_| {
            ForecastError::DataShape(format!(
                "Column '{}' not found; available columns: {}",
                name,
                self.column_names().join(", ")
            ))
        })
    }

    /// Read a column as numbers. Text is trimmed, thousands separators
    /// removed, and anything unparseable becomes `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.require_column(name)?;
        let dtype = col.dtype().clone();

        if matches!(dtype, DataType::Utf8) {
            let ca = col.utf8()?;
            return Ok(ca.into_iter().map(|v| v.and_then(parse_number)).collect());
        }

        if dtype.is_numeric() || matches!(dtype, DataType::Boolean) {
            let casted = col.cast(&DataType::Float64)?;
            let ca = casted.f64()?;
            return Ok(ca
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect());
        }

        Err(ForecastError::DataShape(format!(
            "Column '{}' of type {} cannot be converted to numbers",
            name, dtype
        )))
    }

    /// Read a column as UTC timestamps; unparseable entries become `None`
    pub fn date_column(&self, name: &str) -> Result<Vec<Option<DateTime<Utc>>>> {
        let col = self.require_column(name)?;

        match col.dtype().clone() {
            DataType::Date => {
                let days = col.cast(&DataType::Int32)?;
                Ok(days
                    .i32()?
                    .into_iter()
                    .map(|d| d.and_then(|d| epoch().checked_add_signed(Duration::days(d as i64))))
                    .collect())
            }
            DataType::Datetime(unit, _) => {
                let raw = col.cast(&DataType::Int64)?;
                let per_second: i64 = match unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                Ok(raw
                    .i64()?
                    .into_iter()
                    .map(|v| {
                        v.and_then(|v| {
                            let secs = v.div_euclid(per_second);
                            let nanos = v.rem_euclid(per_second) * (1_000_000_000 / per_second);
                            Utc.timestamp_opt(secs, nanos as u32).single()
                        })
                    })
                    .collect())
            }
            DataType::Utf8 => Ok(col
                .utf8()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp))
                .collect()),
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
                // Integer dates are read through their text form, e.g. 2019 or 20190827
                let text = col.cast(&DataType::Utf8)?;
                Ok(text
                    .utf8()?
                    .into_iter()
                    .map(|v| v.and_then(parse_timestamp))
                    .collect())
            }
            dtype => Err(ForecastError::DataShape(format!(
                "Column '{}' of type {} cannot be converted to dates",
                name, dtype
            ))),
        }
    }

    /// Per-column structure and descriptive statistics
    pub fn summary(&self) -> Result<DatasetSummary> {
        let mut columns = Vec::with_capacity(self.df.width());

        for col in self.df.get_columns() {
            let dtype = col.dtype().clone();
            let stats = if dtype.is_numeric() {
                let casted = col.cast(&DataType::Float64)?;
                let observed: Vec<f64> = casted
                    .f64()?
                    .into_iter()
                    .flatten()
                    .filter(|v| v.is_finite())
                    .collect();
                describe(&observed)
            } else if matches!(dtype, DataType::Utf8) {
                // Text columns count as numeric when most present cells parse
                let present: Vec<&str> = col.utf8()?.into_iter().flatten().collect();
                let observed: Vec<f64> = present.iter().filter_map(|v| parse_number(v)).collect();
                if !observed.is_empty() && observed.len() * 2 >= present.len() {
                    describe(&observed)
                } else {
                    None
                }
            } else {
                None
            };

            columns.push(ColumnSummary {
                name: col.name().to_string(),
                dtype: dtype.to_string(),
                count: col.len(),
                missing: col.null_count(),
                stats,
            });
        }

        Ok(DatasetSummary {
            rows: self.df.height(),
            columns,
        })
    }

    /// Clean the dataset into a gap-free target series.
    ///
    /// Column names are trimmed first, so `spec` refers to trimmed names.
    pub fn clean(&self, spec: &CleaningSpec) -> Result<CleanedData> {
        let mut dataset = self.clone();
        dataset.normalize_column_names()?;

        debug!("Using {} for forecasting", spec.target_column);
        let target_raw = dataset.numeric_column(&spec.target_column)?;
        let mut covariates_raw = Vec::with_capacity(spec.numeric_columns.len());
        for rule in &spec.numeric_columns {
            covariates_raw.push(dataset.numeric_column(&rule.name)?);
        }

        let height = dataset.height();
        let timestamps: Vec<Option<DateTime<Utc>>> = match &spec.date_column {
            Some(date_column) => {
                let parsed = dataset.date_column(date_column)?;
                if height > 0 && parsed.iter().all(|d| d.is_none()) {
                    return Err(ForecastError::DataShape(format!(
                        "No value in column '{}' could be parsed as a date",
                        date_column
                    )));
                }
                parsed
            }
            None => {
                let origin = Utc.from_utc_datetime(&spec.synthetic_start.and_time(NaiveTime::MIN));
                (0..height)
                    .map(|i| Some(origin + Duration::days(i as i64)))
                    .collect()
            }
        };

        // Rows with usable dates, in chronological order, first occurrence of each date
        let mut rows: Vec<(usize, DateTime<Utc>)> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, t)))
            .collect();
        let invalid_dates = height - rows.len();
        if invalid_dates > 0 {
            warn!("Dropped {} rows with invalid dates", invalid_dates);
        }
        rows.sort_by_key(|&(i, t)| (t, i));
        let before_dedup = rows.len();
        rows.dedup_by_key(|&mut (_, t)| t);
        let duplicates = before_dedup - rows.len();
        if duplicates > 0 {
            warn!("Dropped {} rows with duplicate dates", duplicates);
        }

        // Drop rows that have a gap in a column whose strategy is Drop
        let mut drop_columns: Vec<&Vec<Option<f64>>> = Vec::new();
        if spec.target_fill == FillStrategy::Drop {
            drop_columns.push(&target_raw);
        }
        for (rule, raw) in spec.numeric_columns.iter().zip(covariates_raw.iter()) {
            if rule.fill == FillStrategy::Drop {
                drop_columns.push(raw);
            }
        }
        let before_drop = rows.len();
        rows.retain(|&(i, _)| drop_columns.iter().all(|col| is_observed(col[i])));
        if rows.len() < before_drop {
            warn!(
                "Dropped {} rows with missing values",
                before_drop - rows.len()
            );
        }

        if rows.is_empty() {
            return Err(ForecastError::DataShape(format!(
                "No usable rows remain for '{}' after cleaning",
                spec.target_column
            )));
        }

        let axis: Vec<f64> = rows.iter().map(|&(_, t)| t.timestamp() as f64).collect();
        let pick = |col: &Vec<Option<f64>>| -> Vec<Option<f64>> {
            rows.iter().map(|&(i, _)| col[i]).collect()
        };

        let target_values = fill_column(
            &spec.target_column,
            &pick(&target_raw),
            &axis,
            spec.target_fill,
        )
        .map_err(|e| match e {
            ForecastError::MathError(_) => ForecastError::DataShape(format!(
                "Target column '{}' has no numeric values",
                spec.target_column
            )),
            other => other,
        })?;

        let mut covariates = Vec::with_capacity(spec.numeric_columns.len());
        for (rule, raw) in spec.numeric_columns.iter().zip(covariates_raw.iter()) {
            let filled = fill_column(&rule.name, &pick(raw), &axis, rule.fill)?;
            covariates.push((rule.name.clone(), filled));
        }

        let target = TimeSeries::new(
            spec.target_column.clone(),
            rows.iter().map(|&(_, t)| t).collect(),
            target_values,
        )?;
        debug!(
            "Preprocessing completed: {} observations from {} to {}",
            target.len(),
            target.timestamps()[0],
            target.timestamps()[target.len() - 1]
        );

        Ok(CleanedData {
            target,
            covariates,
            dropped_rows: height - rows.len(),
        })
    }
}

fn workbook_error(path: &Path, err: impl fmt::Display) -> ForecastError {
    ForecastError::DataError(format!("Cannot read workbook {}: {}", path.display(), err))
}

/// Build a text-typed frame from a worksheet whose first row is the header
fn dataframe_from_range(range: &calamine::Range<CellValue>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ForecastError::DataShape("Worksheet is empty".to_string()))?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| cell_text(cell).unwrap_or_else(|| format!("column_{}", i + 1)))
        .collect();

    let mut columns: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(range.height().saturating_sub(1)); names.len()];
    for row in rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(row.get(idx).and_then(cell_text));
        }
    }

    let series: Vec<Series> = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str(), values))
        .collect();
    Ok(DataFrame::new(series)?)
}

fn cell_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        CellValue::Float(f) => Some(f.to_string()),
        CellValue::Int(i) => Some(i.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::DateTime(serial) => excel_serial_to_text(*serial),
        _ => None,
    }
}

/// Excel serial dates count days from 1899-12-30
fn excel_serial_to_text(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let moment = base.checked_add_signed(Duration::seconds((serial * 86_400.0).round() as i64))?;
    Some(moment.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn is_observed(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite())
}

fn fill_column(
    name: &str,
    values: &[Option<f64>],
    axis: &[f64],
    strategy: FillStrategy,
) -> Result<Vec<f64>> {
    let observed: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();
    let missing = values.len() - observed.len();
    if missing > 0 {
        debug!("Filling {} missing values in '{}' ({:?})", missing, name, strategy);
    }

    let constant = match strategy {
        FillStrategy::Mean => Some(stats::mean(&observed)?),
        FillStrategy::Median => Some(stats::median(&observed)?),
        FillStrategy::Interpolate => return Ok(interpolate_linear(axis, values)?),
        FillStrategy::Drop => None,
    };

    values
        .iter()
        .map(|v| match (v.filter(|x| x.is_finite()), constant) {
            (Some(x), _) => Ok(x),
            (None, Some(c)) => Ok(c),
            (None, None) => Err(ForecastError::DataError(format!(
                "Column '{}' still has missing values",
                name
            ))),
        })
        .collect()
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

/// Parse a number the way spreadsheets export it: `" 1,234.50 "` is 1234.5
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%Y%m%d",
];

/// Parse a date or datetime string into UTC. Returns `None` when no known
/// format matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    // Year only
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    None
}

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

fn describe(observed: &[f64]) -> Option<ColumnStats> {
    let mean = stats::mean(observed).ok()?;
    let std_dev = stats::population_std_dev(observed).ok()?;
    Some(ColumnStats {
        mean,
        std_dev,
        min: observed.iter().copied().fold(f64::INFINITY, f64::min),
        max: observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Structure of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub count: usize,
    pub missing: usize,
    pub stats: Option<ColumnStats>,
}

/// Structure of a loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {} rows, {} columns", self.rows, self.columns.len())?;
        for col in &self.columns {
            write!(
                f,
                "  {:<24} {:<10} missing {:>6}",
                col.name, col.dtype, col.missing
            )?;
            if let Some(s) = &col.stats {
                write!(
                    f,
                    "  mean {:.4}  std {:.4}  min {:.4}  max {:.4}",
                    s.mean, s.std_dev, s.min, s.max
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new(" Date ", &["2023-01-03", "2023-01-01", "bad", "2023-01-02", "2023-01-01"]),
            Series::new("Price ", &[Some(3.0), Some(1.0), Some(9.0), None, Some(5.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn parses_common_date_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-01-15"), Some(expected));
        assert_eq!(parse_timestamp("01/15/2023"), Some(expected));
        assert_eq!(parse_timestamp("Jan 15, 2023"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-01-15T14:30:45"),
            Some(Utc.with_ymd_and_hms(2023, 1, 15, 14, 30, 45).unwrap())
        );
        assert_eq!(
            parse_timestamp("2019"),
            Some(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn parses_spreadsheet_numbers() {
        assert_eq!(parse_number(" 1,234.50 "), Some(1234.5));
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn cleaning_sorts_dedups_and_interpolates() {
        let dataset = DataLoader::from_dataframe(frame()).unwrap();
        let spec = CleaningSpec::new("Price").with_date_column("Date");
        let cleaned = dataset.clean(&spec).unwrap();

        assert_eq!(cleaned.target.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(cleaned.dropped_rows, 2);
        assert_eq!(
            cleaned.target.timestamps()[0],
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_target_column_is_a_shape_error() {
        let dataset = DataLoader::from_dataframe(frame()).unwrap();
        let spec = CleaningSpec::new("GOLDPRICE").with_date_column("Date");
        let err = dataset.clean(&spec).unwrap_err();
        assert!(matches!(err, ForecastError::DataShape(msg) if msg.contains("GOLDPRICE")));
    }

    #[test]
    fn synthetic_dates_without_date_column() {
        let df = DataFrame::new(vec![Series::new("Price", &[Some(10.0), None, Some(30.0)])]).unwrap();
        let dataset = DataLoader::from_dataframe(df).unwrap();
        let spec = CleaningSpec::new("Price").with_target_fill(FillStrategy::Mean);
        let cleaned = dataset.clean(&spec).unwrap();

        assert_eq!(cleaned.target.values(), &[10.0, 20.0, 30.0]);
        assert_eq!(
            cleaned.target.timestamps()[2],
            Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn worksheet_cells_become_text_columns() {
        let mut range = calamine::Range::new((0, 0), (3, 1));
        range.set_value((0, 0), CellValue::String(" INDEXDATE ".to_string()));
        range.set_value((0, 1), CellValue::String("INDEXCLOSE".to_string()));
        range.set_value((1, 0), CellValue::DateTime(43700.5));
        range.set_value((1, 1), CellValue::Float(1234.5));
        range.set_value((2, 0), CellValue::String("2019-08-27".to_string()));
        range.set_value((2, 1), CellValue::String("n/a".to_string()));
        range.set_value((3, 1), CellValue::Int(1300));

        let df = dataframe_from_range(&range).unwrap();
        assert_eq!(df.get_column_names(), vec!["INDEXDATE", "INDEXCLOSE"]);
        assert_eq!(df.column("INDEXCLOSE").unwrap().dtype(), &DataType::Utf8);

        let dataset = DataLoader::from_dataframe(df).unwrap();
        assert_eq!(
            dataset.numeric_column("INDEXCLOSE").unwrap(),
            vec![Some(1234.5), None, Some(1300.0)]
        );
        assert_eq!(
            dataset.date_column("INDEXDATE").unwrap(),
            vec![
                Some(Utc.with_ymd_and_hms(2019, 8, 23, 12, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2019, 8, 27, 0, 0, 0).unwrap()),
                None,
            ]
        );
    }

    #[test]
    fn loader_dispatches_on_extension() {
        let dir = std::env::temp_dir();
        for name in ["missing_prices.xls", "missing_prices.xlsx", "missing_prices.csv"] {
            let err = DataLoader::from_path(dir.join(name)).unwrap_err();
            assert!(matches!(err, ForecastError::IoError(_)), "{}: {:?}", name, err);
        }
        let err = DataLoader::from_path(dir.join("prices.txt")).unwrap_err();
        assert!(matches!(err, ForecastError::DataShape(_)));
    }

    #[test]
    fn series_rejects_unordered_timestamps() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert!(TimeSeries::new("x", vec![t, t], vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::new("x", vec![t], vec![f64::NAN]).is_err());
    }
}
