use crate::domain::CellGrid;
use crate::modules::smearing::SmearingHistograms;
use crate::numerics::{LinearSpline, SplineFitError, deterministic_argsort};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSpline {
    Linear(LinearSpline),
    /// Fallback for cells whose histogram cannot be fitted.
    Zero,
}

impl ResponseSpline {
    pub fn fit(centers: &[f64], values: &[f64]) -> Self {
        match fit_sorted(centers, values) {
            Ok(spline) => Self::Linear(spline),
            Err(reason) => {
                trace!(%reason, "smearing histogram not fittable, using zero response");
                Self::Zero
            }
        }
    }

    /// Non-negative densities at `energies`; zero outside the fitted domain.
    pub fn evaluate(&self, energies: &[f64]) -> Vec<f64> {
        match self {
            Self::Linear(spline) => spline
                .evaluate(energies)
                .into_iter()
                .map(|density| density.max(0.0))
                .collect(),
            Self::Zero => vec![0.0; energies.len()],
        }
    }

    pub const fn is_zero(&self) -> bool {
        matches!(self, Self::Zero)
    }
}

fn fit_sorted(centers: &[f64], values: &[f64]) -> Result<LinearSpline, SplineFitError> {
    if centers.len() != values.len() {
        return Err(SplineFitError::LengthMismatch {
            knots: centers.len(),
            values: values.len(),
        });
    }

    let order = deterministic_argsort(centers);
    let knots = order.iter().map(|index| centers[*index]).collect();
    let sorted_values = order.iter().map(|index| values[*index]).collect();
    LinearSpline::fit(knots, sorted_values)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSplineBuilder;

impl ResponseSplineBuilder {
    pub fn build(&self, histograms: &SmearingHistograms) -> CellGrid<ResponseSpline> {
        build_response_splines(&histograms.centers, &histograms.values)
    }
}

pub fn build_response_splines(
    centers: &CellGrid<Vec<f64>>,
    values: &CellGrid<Vec<f64>>,
) -> CellGrid<ResponseSpline> {
    let (angles, energies) = centers.shape();
    CellGrid::from_fn(angles, energies, |angle_index, energy_index| {
        match (
            centers.get(angle_index, energy_index),
            values.get(angle_index, energy_index),
        ) {
            (Some(centers), Some(values)) => ResponseSpline::fit(centers, values),
            _ => ResponseSpline::Zero,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{ResponseSpline, build_response_splines};
    use crate::domain::CellGrid;

    #[test]
    fn unsorted_histograms_are_reordered_with_their_values() {
        let spline = ResponseSpline::fit(&[2.5, 2.1, 2.3], &[1.0, 3.0, 2.0]);
        let ResponseSpline::Linear(inner) = &spline else {
            panic!("histogram should be fittable");
        };
        assert_eq!(inner.knots(), &[2.1, 2.3, 2.5]);
        assert_eq!(inner.values(), &[3.0, 2.0, 1.0]);
        assert_eq!(spline.evaluate(&[2.1, 2.5]), vec![3.0, 1.0]);
    }

    #[test]
    fn degenerate_histograms_fall_back_to_zero() {
        for (centers, values) in [
            (vec![], vec![]),
            (vec![2.1], vec![3.0]),
            (vec![2.1, 2.1], vec![3.0, 1.0]),
            (vec![2.1, 2.5], vec![3.0]),
            (vec![2.1, f64::NAN], vec![3.0, 1.0]),
        ] {
            let spline = ResponseSpline::fit(&centers, &values);
            assert!(spline.is_zero());
            assert_eq!(spline.evaluate(&[2.0, 2.2, 2.4, 2.6]), vec![0.0; 4]);
            assert!(spline.evaluate(&[]).is_empty());
        }
    }

    #[test]
    fn evaluation_is_zero_outside_fitted_domain() {
        let spline = ResponseSpline::fit(&[2.1, 2.5], &[3.0, 1.0]);
        assert_eq!(spline.evaluate(&[1.0, 2.0, 2.6, 9.0]), vec![0.0; 4]);
        let midpoint = spline.evaluate(&[2.3]);
        assert!((midpoint[0] - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn negative_counts_never_produce_negative_density() {
        let spline = ResponseSpline::fit(&[1.0, 2.0], &[-1.0, 1.0]);
        assert_eq!(spline.evaluate(&[1.0, 1.5, 2.0]), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn builder_fits_one_spline_per_cell() {
        let centers = CellGrid::from_fn(1, 2, |_, energy| {
            if energy == 0 { vec![2.1, 2.5] } else { Vec::new() }
        });
        let values = CellGrid::from_fn(1, 2, |_, energy| {
            if energy == 0 { vec![3.0, 1.0] } else { Vec::new() }
        });

        let splines = build_response_splines(&centers, &values);
        assert_eq!(splines.shape(), (1, 2));
        assert!(!splines.get(0, 0).expect("cell").is_zero());
        assert!(splines.get(0, 1).expect("cell").is_zero());
    }
}
