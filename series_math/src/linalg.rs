//! Dense least squares helpers

use crate::{MathError, Result};

/// Solve `A x = b` for a symmetric positive definite `A` via Cholesky.
///
/// `a` is given row-major as `n` rows of length `n`.
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {}x{} matrix",
            n, n
        )));
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(MathError::SingularMatrix);
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L' x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Ok(x)
}

/// Penalized least squares: minimize `|y - X b|^2 + sum_j penalties[j] * b_j^2`.
///
/// `design` holds one row per observation. Each coefficient gets its own
/// penalty, which is how Gaussian priors with different scales are expressed.
pub fn ridge_regression(design: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if design.is_empty() || design.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            y.len()
        )));
    }

    let k = penalties.len();
    if design.iter().any(|row| row.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "Every design row must have {} columns",
            k
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y.iter()) {
        for i in 0..k {
            if row[i] == 0.0 {
                continue;
            }
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += penalties[i];
    }

    solve_symmetric(&xtx, &xty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solves_small_system() {
        let a = vec![vec![4.0, 1.0], vec![1.0, 3.0]];
        let x = solve_symmetric(&a, &[1.0, 2.0]).unwrap();
        assert_relative_eq!(x[0], 1.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 7.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn detects_singular_matrix() {
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert_eq!(solve_symmetric(&a, &[1.0, 1.0]), Err(MathError::SingularMatrix));
    }

    #[test]
    fn ridge_recovers_line_with_tiny_penalty() {
        let design: Vec<Vec<f64>> = (0..20).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| 3.0 + 0.5 * i as f64).collect();
        let beta = ridge_regression(&design, &y, &[1e-10, 1e-10]).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(beta[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn ridge_penalty_shrinks_coefficient() {
        let design: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| 2.0 * i as f64).collect();
        let free = ridge_regression(&design, &y, &[0.0]).unwrap();
        let shrunk = ridge_regression(&design, &y, &[1000.0]).unwrap();
        assert!(shrunk[0].abs() < free[0].abs());
    }
}
