#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineFitError {
    #[error("linear spline requires at least 2 knots, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("linear spline input length mismatch: knots={knots}, values={values}")]
    LengthMismatch { knots: usize, values: usize },
    #[error("spline knot must be finite at index {index}, got {value}")]
    NonFiniteKnot { index: usize, value: f64 },
    #[error("spline value must be finite at index {index}, got {value}")]
    NonFiniteValue { index: usize, value: f64 },
    #[error("spline knots must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingKnots {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Degree-1 interpolant through `(knots[i], values[i])` that evaluates to zero
/// outside `[knots[0], knots[last]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
}

impl LinearSpline {
    pub fn fit(knots: Vec<f64>, values: Vec<f64>) -> Result<Self, SplineFitError> {
        if knots.len() != values.len() {
            return Err(SplineFitError::LengthMismatch {
                knots: knots.len(),
                values: values.len(),
            });
        }
        if knots.len() < 2 {
            return Err(SplineFitError::InsufficientPoints {
                actual: knots.len(),
            });
        }

        for (index, knot) in knots.iter().copied().enumerate() {
            if !knot.is_finite() {
                return Err(SplineFitError::NonFiniteKnot { index, value: knot });
            }
            if index > 0 && knot <= knots[index - 1] {
                return Err(SplineFitError::NonIncreasingKnots {
                    index,
                    previous: knots[index - 1],
                    current: knot,
                });
            }
        }
        if let Some((index, value)) = values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(SplineFitError::NonFiniteValue { index, value });
        }

        Ok(Self { knots, values })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    pub fn evaluate_at(&self, x: f64) -> f64 {
        let (lower_bound, upper_bound) = self.domain();
        if !(lower_bound..=upper_bound).contains(&x) {
            return 0.0;
        }

        // `x >= knots[0]` here, so `upper >= 1`.
        let upper = self.knots.partition_point(|knot| *knot <= x);
        if upper == self.knots.len() {
            return self.values[upper - 1];
        }

        let lower = upper - 1;
        let x0 = self.knots[lower];
        let x1 = self.knots[upper];
        let fraction = (x - x0) / (x1 - x0);
        self.values[lower] + (self.values[upper] - self.values[lower]) * fraction
    }

    pub fn evaluate(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|x| self.evaluate_at(*x)).collect()
    }
}
