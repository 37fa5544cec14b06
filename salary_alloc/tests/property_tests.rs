use approx::assert_relative_eq;
use proptest::prelude::*;
use salary_alloc::{recommended_percentage, Allocation};

proptest! {
    #[test]
    fn middle_band_recommends_fifteen_percent(salary in 30_000.0..60_000.0f64) {
        prop_assert_eq!(recommended_percentage(salary), 15.0);
    }

    #[test]
    fn recommendation_is_a_known_band(salary in 0.01..1e9f64) {
        let percent = recommended_percentage(salary);
        prop_assert!([10.0, 15.0, 20.0, 25.0].contains(&percent));
    }

    #[test]
    fn portions_add_up_to_salary(salary in 0.01..1e9f64, percent in 0.0..=100.0f64) {
        let allocation = Allocation::new(salary, percent).unwrap();
        assert_relative_eq!(allocation.invest() + allocation.manage(), salary, max_relative = 1e-12);
        prop_assert!(allocation.invest() >= 0.0);
        prop_assert!(allocation.manage() >= -1e-9 * salary);
    }

    #[test]
    fn out_of_range_percent_is_rejected(salary in 0.01..1e9f64, excess in 1e-6..1e6f64) {
        prop_assert!(Allocation::new(salary, 100.0 + excess).is_err());
        prop_assert!(Allocation::new(salary, -excess).is_err());
    }
}
