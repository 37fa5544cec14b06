//! Gap filling along an ordered axis

use crate::{MathError, Result};

/// Fill missing values by linear interpolation over the positions in `axis`.
///
/// `axis` must be non-decreasing and as long as `values`. Gaps before the
/// first or after the last observation take the nearest observed value.
pub fn interpolate_linear(axis: &[f64], values: &[Option<f64>]) -> Result<Vec<f64>> {
    if axis.len() != values.len() {
        return Err(MathError::InvalidInput(format!(
            "Axis has {} positions but there are {} values",
            axis.len(),
            values.len()
        )));
    }

    let observed: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|_| i))
        .collect();

    let (first, last) = match (observed.first(), observed.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(MathError::InsufficientData(
                "No observed values to interpolate from".to_string(),
            ))
        }
    };

    let value_at = |i: usize| values[i].unwrap_or(f64::NAN);
    let mut out = Vec::with_capacity(values.len());
    let mut next_obs = 0;

    for i in 0..values.len() {
        while next_obs < observed.len() && observed[next_obs] < i {
            next_obs += 1;
        }

        if i <= first {
            out.push(value_at(first));
        } else if i >= last {
            out.push(if observed.get(next_obs) == Some(&i) {
                value_at(i)
            } else {
                value_at(last)
            });
        } else if observed.get(next_obs) == Some(&i) {
            out.push(value_at(i));
        } else {
            let left = observed[next_obs - 1];
            let right = observed[next_obs];
            let span = axis[right] - axis[left];
            let weight = if span > 0.0 {
                (axis[i] - axis[left]) / span
            } else {
                0.0
            };
            out.push(value_at(left) + weight * (value_at(right) - value_at(left)));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_interior_gap_by_axis_distance() {
        let axis = [0.0, 1.0, 3.0, 4.0];
        let values = [Some(0.0), None, None, Some(8.0)];
        let filled = interpolate_linear(&axis, &values).unwrap();
        assert_eq!(filled, vec![0.0, 2.0, 6.0, 8.0]);
    }

    #[test]
    fn edges_take_nearest_observation() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values = [None, Some(5.0), None, Some(7.0), None];
        let filled = interpolate_linear(&axis, &values).unwrap();
        assert_eq!(filled, vec![5.0, 5.0, 6.0, 7.0, 7.0]);
    }

    #[test]
    fn nan_counts_as_missing() {
        let axis = [0.0, 1.0, 2.0];
        let values = [Some(1.0), Some(f64::NAN), Some(3.0)];
        assert_eq!(interpolate_linear(&axis, &values).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn all_missing_is_an_error() {
        assert!(interpolate_linear(&[0.0, 1.0], &[None, None]).is_err());
        assert!(interpolate_linear(&[0.0], &[Some(1.0), None]).is_err());
    }
}
