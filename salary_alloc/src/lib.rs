//! # Salary Alloc
//!
//! Splits a salary into an investing portion and a management portion.
//!
//! The recommended investing share grows with the salary bracket:
//!
//! | Salary            | Investing |
//! |-------------------|-----------|
//! | below 30,000      | 10%       |
//! | 30,000 to 59,999  | 15%       |
//! | 60,000 to 99,999  | 20%       |
//! | 100,000 and above | 25%       |
//!
//! ```
//! use salary_alloc::{format_currency, recommended_percentage, Allocation};
//!
//! let percent = recommended_percentage(45_000.0);
//! let allocation = Allocation::new(45_000.0, percent).unwrap();
//! assert_eq!(format_currency(allocation.invest()), "$6,750.00");
//! assert_eq!(format_currency(allocation.manage()), "$38,250.00");
//! ```

pub mod session;

pub use session::{Session, SessionEnd};

use thiserror::Error;

/// Errors raised while computing an allocation
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("Salary must be a positive number, got {0}")]
    InvalidSalary(f64),

    #[error("Percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, AllocationError>;

/// Recommended investing share, in percent, for a salary
pub fn recommended_percentage(salary: f64) -> f64 {
    if salary < 30_000.0 {
        10.0
    } else if salary < 60_000.0 {
        15.0
    } else if salary < 100_000.0 {
        20.0
    } else {
        25.0
    }
}

/// A salary divided into investing and management amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    salary: f64,
    percent: f64,
    invest: f64,
}

impl Allocation {
    /// Invest `percent` of `salary`; the remainder goes to management
    pub fn new(salary: f64, percent: f64) -> Result<Self> {
        if !(salary.is_finite() && salary > 0.0) {
            return Err(AllocationError::InvalidSalary(salary));
        }
        if !(0.0..=100.0).contains(&percent) {
            return Err(AllocationError::InvalidPercentage(percent));
        }

        Ok(Self {
            salary,
            percent,
            invest: salary * percent / 100.0,
        })
    }

    /// Allocation using the recommended share for this salary
    pub fn recommended(salary: f64) -> Result<Self> {
        Self::new(salary, recommended_percentage(salary))
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    /// Investing share in percent
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Amount to invest
    pub fn invest(&self) -> f64 {
        self.invest
    }

    /// Amount left for management
    pub fn manage(&self) -> f64 {
        self.salary - self.invest
    }
}

/// Format an amount as dollars with thousands separators and two decimals,
/// e.g. `$1,234.50` or `-$12.00`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1_000.0, 10.0)]
    #[case(29_999.99, 10.0)]
    #[case(30_000.0, 15.0)]
    #[case(59_999.0, 15.0)]
    #[case(60_000.0, 20.0)]
    #[case(99_999.0, 20.0)]
    #[case(100_000.0, 25.0)]
    #[case(1_000_000.0, 25.0)]
    fn brackets(#[case] salary: f64, #[case] expected: f64) {
        assert_eq!(recommended_percentage(salary), expected);
    }

    #[rstest]
    #[case(0.0, "$0.00")]
    #[case(6_750.0, "$6,750.00")]
    #[case(38_250.0, "$38,250.00")]
    #[case(999.999, "$1,000.00")]
    #[case(1_234_567.891, "$1,234,567.89")]
    #[case(-12.5, "-$12.50")]
    fn currency(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_currency(amount), expected);
    }

    #[test]
    fn allocation_splits_salary() {
        let a = Allocation::new(45_000.0, 15.0).unwrap();
        assert_relative_eq!(a.invest(), 6_750.0);
        assert_relative_eq!(a.manage(), 38_250.0);
        assert_relative_eq!(a.invest() + a.manage(), a.salary());
    }

    #[test]
    fn recommended_allocation_uses_bracket() {
        let a = Allocation::recommended(120_000.0).unwrap();
        assert_eq!(a.percent(), 25.0);
        assert_relative_eq!(a.invest(), 30_000.0);
    }

    #[rstest]
    #[case(0.0, 10.0)]
    #[case(-100.0, 10.0)]
    #[case(f64::NAN, 10.0)]
    #[case(1_000.0, -1.0)]
    #[case(1_000.0, 100.5)]
    #[case(1_000.0, f64::NAN)]
    fn invalid_inputs(#[case] salary: f64, #[case] percent: f64) {
        assert!(Allocation::new(salary, percent).is_err());
    }
}
