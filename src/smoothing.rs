//! A nearest-neighbor density smoother over integer severities.
//!
//! Severity weights read off a factor marginal are sparse: only the severities seen in the
//! records carry weight. `KnnDensity` fits a k-nearest-neighbor regressor to those (severity,
//! weight) points and normalizes its predictions over the observed range into a probability mass
//! function.

use crate::util::{GraphError, Result};

use itertools::Itertools;
use ndarray::Array1;


/// Offset added before taking the log of a mass, so that zero mass stays finite
const LOG_OFFSET: f64 = 1e-11;

/// Widest `[xmin, xmax]` range the partition is summed over
pub const MAX_SPAN: u64 = 100_000;

#[derive(Clone, Debug)]
struct Fitted {
    x: Vec<i64>,
    y: Vec<f64>,
    xmin: i64,
    xmax: i64,
    partition: f64
}

/// A k-nearest-neighbor regression normalized into a pmf on `[xmin, xmax]`.
#[derive(Clone, Debug)]
pub struct KnnDensity {
    neighbors: usize,
    fitted: Option<Fitted>
}

impl KnnDensity {

    /// Construct an unfitted smoother averaging over `neighbors` points
    pub fn new(neighbors: usize) -> Self {
        KnnDensity { neighbors, fitted: None }
    }

    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit the regressor to the points `(x[i], y[i])`.
    ///
    /// The partition is the sum of the predictions at every integer in `[min(x), max(x)]`.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if there are no points, `x` and `y` differ in length, a `y` is
    ///   not finite, the neighbor count is 0 or exceeds the number of points, or `max(x) - min(x)`
    ///   exceeds `MAX_SPAN`
    pub fn fit(&mut self, x: &[i64], y: &[f64]) -> Result<()> {
        if x.is_empty() {
            return Err(GraphError::invalid("cannot fit a density to no points"));
        } else if x.len() != y.len() {
            return Err(GraphError::invalid(
                format!("{} positions but {} weights", x.len(), y.len())
            ));
        } else if self.neighbors == 0 || self.neighbors > x.len() {
            return Err(GraphError::invalid(format!(
                "cannot average {} neighbors of {} points", self.neighbors, x.len()
            )));
        } else if let Some(w) = y.iter().find(|w| ! w.is_finite()) {
            return Err(GraphError::invalid(format!("weight {} is not finite", w)));
        }

        let (xmin, xmax) = match x.iter().minmax().into_option() {
            Some((&lo, &hi)) => (lo, hi),
            None => return Err(GraphError::invalid("cannot fit a density to no points"))
        };

        if xmax.abs_diff(xmin) > MAX_SPAN {
            return Err(GraphError::invalid(format!(
                "range [{}, {}] is wider than {} values", xmin, xmax, MAX_SPAN
            )));
        }

        let mut fitted = Fitted { x: x.to_vec(), y: y.to_vec(), xmin, xmax, partition: 0.0 };
        fitted.partition = (xmin..=xmax).map(|v| nearest_mean(&fitted, self.neighbors, v)).sum();

        self.fitted = Some(fitted);
        Ok(())
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or_else(|| GraphError::not_ready("density has not been fit"))
    }

    /// The `(xmin, xmax)` range of the fitted points
    pub fn support(&self) -> Option<(i64, i64)> {
        self.fitted.as_ref().map(|f| (f.xmin, f.xmax))
    }

    pub fn partition(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.partition)
    }

    /// The mean weight of the `k` fitted points nearest to `x`. Ties in distance go to the point
    /// fitted first.
    ///
    /// # Errors
    /// * `GraphError::NotReady` before `fit`
    pub fn predict(&self, x: i64) -> Result<f64> {
        Ok(nearest_mean(self.fitted()?, self.neighbors, x))
    }

    /// The probability mass at `x`: 0 outside the fitted range or when the partition is 0.
    ///
    /// # Errors
    /// * `GraphError::NotReady` before `fit`
    pub fn pmf(&self, x: i64) -> Result<f64> {
        let fitted = self.fitted()?;
        if x < fitted.xmin || x > fitted.xmax || fitted.partition == 0.0 {
            return Ok(0.0);
        }

        Ok(nearest_mean(fitted, self.neighbors, x) / fitted.partition)
    }

    /// `pmf` at every point of `xs`
    pub fn pmf_many(&self, xs: &[i64]) -> Result<Array1<f64>> {
        let masses: Result<Vec<f64>> = xs.iter().map(|&x| self.pmf(x)).collect();
        Ok(Array1::from(masses?))
    }

    /// The natural log of the mass at `x`, offset by 1e-11
    pub fn log_pmf(&self, x: i64) -> Result<f64> {
        Ok((self.pmf(x)? + LOG_OFFSET).ln())
    }
}

fn nearest_mean(fitted: &Fitted, k: usize, x: i64) -> f64 {
    let total: f64 = (0..fitted.x.len()).sorted_by_key(|&i| fitted.x[i].abs_diff(x))
                                        .take(k)
                                        .map(|i| fitted.y[i])
                                        .sum();
    total / k as f64
}
