pub mod interpolation;

pub use interpolation::{LinearSpline, SplineFitError};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn deterministic_argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        values[*lhs]
            .total_cmp(&values[*rhs])
            .then_with(|| lhs.cmp(rhs))
    });
    indices
}

/// Returns `None` when the lengths differ. Fewer than two samples integrate to zero.
pub fn trapezoid(y: &[f64], x: &[f64]) -> Option<f64> {
    if y.len() != x.len() {
        return None;
    }

    let mut sum = 0.0;
    let mut correction = 0.0;
    for (xs, ys) in x.windows(2).zip(y.windows(2)) {
        kahan_add(&mut sum, &mut correction, 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]));
    }

    Some(sum)
}

pub fn linear_grid(start: f64, end: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 {
        return None;
    }

    let step = (end - start) / ((count - 1) as f64);
    let mut grid = Vec::with_capacity(count);
    for index in 0..count {
        grid.push(start + step * (index as f64));
    }

    if let Some(last) = grid.last_mut() {
        *last = end;
    }

    Some(grid)
}

pub fn log_grid(start_log10: f64, end_log10: f64, count: usize) -> Option<Vec<f64>> {
    linear_grid(start_log10, end_log10, count)
        .map(|exponents| exponents.into_iter().map(|exponent| 10f64.powf(exponent)).collect())
}

pub fn stepped_range(start: f64, stop: f64, step: f64) -> Option<Vec<f64>> {
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() || step <= 0.0 {
        return None;
    }

    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    Some((0..count).map(|index| start + step * index as f64).collect())
}

pub fn geometric_centers(edges: &[f64]) -> Vec<f64> {
    edges
        .windows(2)
        .map(|window| (window[0] * window[1]).sqrt())
        .collect()
}

pub fn within_tolerance(lhs: f64, rhs: f64, abs_tol: f64, rel_tol: f64) -> bool {
    let abs_diff = (lhs - rhs).abs();
    let scale = lhs.abs().max(rhs.abs());
    abs_diff <= abs_tol || abs_diff <= rel_tol * scale
}

#[cfg(test)]
mod tests {
    use super::{
        deterministic_argsort, geometric_centers, linear_grid, log_grid, stable_sum,
        stepped_range, trapezoid, within_tolerance,
    };

    #[test]
    fn stable_sum_reduces_order_loss_for_large_and_small_values() {
        let input = [1.0e16, 1.0, -1.0e16];
        assert_eq!(stable_sum(&input), 0.0);
    }

    #[test]
    fn deterministic_argsort_orders_by_value_then_index() {
        let values = [2.0, 1.0, f64::NAN, 1.0, -0.0, 0.0];
        let order = deterministic_argsort(&values);
        assert_eq!(order, vec![4, 5, 1, 3, 0, 2]);
    }

    #[test]
    fn trapezoid_matches_hand_computed_areas() {
        assert_eq!(trapezoid(&[3.0, 1.0], &[2.1, 2.5]).map(|area| (area * 10.0).round()), Some(8.0));
        let area = trapezoid(&[0.0, 1.0, 0.0], &[0.0, 1.0, 3.0]).expect("area");
        assert!((area - 1.5).abs() < 1.0e-12);
        assert_eq!(trapezoid(&[4.0], &[1.0]), Some(0.0));
        assert_eq!(trapezoid(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn linear_grid_is_inclusive_and_rejects_invalid_counts() {
        assert_eq!(linear_grid(0.0, 1.0, 1), None);
        let grid = linear_grid(0.0, 2.0, 5).expect("grid");
        assert_eq!(grid, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn log_grid_spans_decades() {
        let grid = log_grid(2.0, 4.0, 3).expect("grid");
        assert!(within_tolerance(grid[0], 100.0, 0.0, 1.0e-12));
        assert!(within_tolerance(grid[1], 1000.0, 0.0, 1.0e-12));
        assert!(within_tolerance(grid[2], 10000.0, 0.0, 1.0e-12));
    }

    #[test]
    fn stepped_range_excludes_stop() {
        assert_eq!(stepped_range(0.0, 3.0, 1.0), Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(stepped_range(0.0, 180.0, 1.0).map(|grid| grid.len()), Some(180));
        assert_eq!(stepped_range(5.0, 1.0, 1.0), Some(Vec::new()));
        assert_eq!(stepped_range(0.0, 1.0, 0.0), None);
    }

    #[test]
    fn geometric_centers_sit_between_edges() {
        let centers = geometric_centers(&[1.0, 100.0, 10000.0]);
        assert_eq!(centers.len(), 2);
        assert!(within_tolerance(centers[0], 10.0, 0.0, 1.0e-12));
        assert!(within_tolerance(centers[1], 1000.0, 0.0, 1.0e-12));
        assert!(geometric_centers(&[1.0]).is_empty());
    }
}
