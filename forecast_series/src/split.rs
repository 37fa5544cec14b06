//! Chronological train / validation / test partitioning

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Share of observations assigned to training and validation; the test
/// partition receives the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, validation: f64) -> Result<Self> {
        let ratios = Self { train, validation };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Both ratios in (0, 1) and leaving room for a test partition
    pub fn validate(&self) -> Result<()> {
        let in_unit = |r: f64| r > 0.0 && r < 1.0;
        if !in_unit(self.train) || !in_unit(self.validation) || self.train + self.validation >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Split ratios must be in (0, 1) with a sum below 1, got train={} validation={}",
                self.train, self.validation
            )));
        }
        Ok(())
    }

    /// Partition sizes `(train, validation, test)` for `n` observations
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        // The epsilon keeps e.g. 0.7 * 90 from flooring to 62
        let portion = |ratio: f64| ((n as f64) * ratio + 1e-9).floor() as usize;
        let train = portion(self.train).min(n);
        let validation = portion(self.validation).min(n - train);
        (train, validation, n - train - validation)
    }
}

/// Three contiguous partitions of one series, in time order
#[derive(Debug, Clone)]
pub struct ChronoSplit {
    train: TimeSeries,
    validation: TimeSeries,
    test: TimeSeries,
}

impl ChronoSplit {
    /// Split `series` by position. No shuffling.
    pub fn new(series: &TimeSeries, ratios: SplitRatios) -> Result<Self> {
        ratios.validate()?;
        let (train_len, val_len, test_len) = ratios.sizes(series.len());
        if train_len == 0 || test_len == 0 {
            return Err(ForecastError::insufficient(
                3,
                series.len(),
                "train/validation/test split",
            ));
        }

        Ok(Self {
            train: series.slice(0, train_len)?,
            validation: series.slice(train_len, train_len + val_len)?,
            test: series.slice(train_len + val_len, series.len())?,
        })
    }

    pub fn train(&self) -> &TimeSeries {
        &self.train
    }

    pub fn validation(&self) -> &TimeSeries {
        &self.validation
    }

    pub fn test(&self) -> &TimeSeries {
        &self.test
    }

    /// Train followed by validation: everything a model may look at
    pub fn history(&self) -> Result<TimeSeries> {
        self.train.concat(&self.validation)
    }

    /// Reassemble the original series
    pub fn concat(&self) -> Result<TimeSeries> {
        self.history()?.concat(&self.test)
    }

    /// `(train, validation, test)` lengths
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.validation.len(), self.test.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn linear(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        TimeSeries::daily("y", start, (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn hundred_points_split_seventy_fifteen_fifteen() {
        let split = ChronoSplit::new(&linear(100), SplitRatios::default()).unwrap();
        assert_eq!(split.sizes(), (70, 15, 15));
        assert_eq!(split.train().values()[69], 69.0);
        assert_eq!(split.validation().values()[0], 70.0);
        assert_eq!(split.test().values()[0], 85.0);
    }

    #[rstest]
    #[case(90, (63, 13, 14))]
    #[case(10, (7, 1, 2))]
    #[case(7, (4, 1, 2))]
    fn sizes_follow_floor_rule(#[case] n: usize, #[case] expected: (usize, usize, usize)) {
        assert_eq!(SplitRatios::default().sizes(n), expected);
    }

    #[test]
    fn concat_reconstructs_series() {
        let series = linear(37);
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        assert_eq!(split.concat().unwrap(), series);
    }

    #[rstest]
    #[case(0.0, 0.15)]
    #[case(0.7, 0.3)]
    #[case(1.2, 0.1)]
    fn invalid_ratios_are_rejected(#[case] train: f64, #[case] validation: f64) {
        assert!(SplitRatios::new(train, validation).is_err());
    }

    #[test]
    fn too_short_series_has_no_test_partition() {
        assert!(ChronoSplit::new(&linear(1), SplitRatios::default()).is_err());
    }
}
