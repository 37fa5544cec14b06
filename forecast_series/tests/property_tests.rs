//! Property-based tests for splitting, metrics and forecast shapes.

use chrono::NaiveDate;
use forecast_series::models::{
    ArimaModel, ArimaOrder, LstmConfig, LstmModel, ProphetConfig, ProphetModel, SarimaModel, SeasonalOrder,
};
use forecast_series::{evaluate, evaluate_model, ChronoSplit, SplitRatios, TimeSeries};
use proptest::prelude::*;

fn make_series(values: Vec<f64>) -> TimeSeries {
    TimeSeries::daily("y", NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), values).unwrap()
}

/// Random walk with a mild drift, so every series has some variance
fn walk_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(-1.0..1.0_f64, len).prop_map(|steps| {
            let mut level = 100.0;
            steps
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    level += s + 0.05;
                    level + (i as f64) * 0.001
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn split_sizes_follow_ratios(n in 3usize..2000) {
        let series = make_series((0..n).map(|i| i as f64).collect());
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        let (train, validation, test) = split.sizes();

        prop_assert_eq!(train + validation + test, n);
        prop_assert_eq!(train, (n as f64 * 0.7 + 1e-9).floor() as usize);
        prop_assert_eq!(validation, (n as f64 * 0.15 + 1e-9).floor() as usize);
        prop_assert_eq!(split.concat().unwrap(), series);
    }

    #[test]
    fn metrics_are_bounded(
        pairs in prop::collection::vec((-1e3..1e3_f64, -1e3..1e3_f64), 1..200)
    ) {
        let (forecast, actual): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let m = evaluate(&forecast, &actual).unwrap();

        prop_assert!(m.mae >= 0.0);
        prop_assert!(m.rmse >= 0.0);
        prop_assert!(m.rmse + 1e-9 >= m.mae);
        prop_assert!(m.r2 <= 1.0);
    }

    #[test]
    fn arima_forecast_matches_test_length(values in walk_strategy(40, 120)) {
        let series = make_series(values);
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        let model = ArimaModel::new(ArimaOrder::new(1, 1, 0));
        let (forecast, _) = evaluate_model(&model, &split).unwrap();
        prop_assert_eq!(forecast.len(), split.test().len());
    }

    #[test]
    fn prophet_forecast_matches_test_length(values in walk_strategy(20, 120)) {
        let series = make_series(values);
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        let model = ProphetModel::new(ProphetConfig::default()).unwrap();
        let (forecast, _) = evaluate_model(&model, &split).unwrap();
        prop_assert_eq!(forecast.len(), split.test().len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sarima_forecast_matches_test_length(values in walk_strategy(40, 120)) {
        let series = make_series(values);
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        let model = SarimaModel::new(ArimaOrder::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 7)).unwrap();
        let (forecast, _) = evaluate_model(&model, &split).unwrap();
        prop_assert_eq!(forecast.len(), split.test().len());
        prop_assert_eq!(forecast.timestamps(), split.test().timestamps());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn lstm_forecast_matches_test_length(values in walk_strategy(30, 80)) {
        let series = make_series(values);
        let split = ChronoSplit::new(&series, SplitRatios::default()).unwrap();
        let config = LstmConfig {
            sequence_length: 5,
            hidden_sizes: vec![4],
            dense_units: 2,
            epochs: 1,
            batch_size: 8,
            learning_rate: 0.01,
            seed: 3,
        };
        let model = LstmModel::new(config).unwrap();
        let (forecast, _) = evaluate_model(&model, &split).unwrap();
        prop_assert_eq!(forecast.len(), split.test().len());
        prop_assert!(forecast.values().iter().all(|v| v.is_finite()));
    }
}
