//! Sigmoid calibration of decision values into class probabilities
//!
//! Used by winner promotion when the chosen estimator has no native
//! probability output. Fits `P(y=1|f) = sigmoid(a*f + b)` on decision
//! values with Newton's method and Platt's small-sample target adjustment.

use crate::error::{Result, TuneError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

const RIDGE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlattCalibrator {
    a: Option<f64>,
    b: Option<f64>,
    max_iter: usize,
    tol: f64,
}

impl PlattCalibrator {
    pub fn new() -> Self {
        Self {
            a: None,
            b: None,
            max_iter: 1000,
            tol: 1e-7,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fitted (slope, intercept), if any
    pub fn parameters(&self) -> Option<(f64, f64)> {
        self.a.zip(self.b)
    }

    pub fn is_fitted(&self) -> bool {
        self.parameters().is_some()
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Fit the sigmoid on decision values against binary labels
    pub fn fit(&mut self, decision: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let n = decision.len();
        if n != labels.len() {
            return Err(TuneError::Shape {
                expected: format!("{n} labels"),
                actual: format!("{}", labels.len()),
            });
        }
        if n == 0 {
            return Err(TuneError::InvalidInput(
                "cannot calibrate on an empty split".to_string(),
            ));
        }

        // Platt's adjusted targets keep the fit away from degenerate
        // 0/1 probabilities on small splits
        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = n as f64 - n_pos;
        let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
        let target_neg = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { target_pos } else { target_neg })
            .collect();

        let mut a = 1.0;
        let mut b = 0.0;

        for _ in 0..self.max_iter {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            let mut hess_aa = RIDGE;
            let mut hess_ab = 0.0;
            let mut hess_bb = RIDGE;

            for (&f, &t) in decision.iter().zip(targets.iter()) {
                let p = Self::sigmoid(a * f + b);
                let d1 = p - t;
                let d2 = p * (1.0 - p);

                grad_a += f * d1;
                grad_b += d1;
                hess_aa += f * f * d2;
                hess_ab += f * d2;
                hess_bb += d2;
            }

            // 2x2 Newton step by Cramer's rule
            let det = hess_aa * hess_bb - hess_ab * hess_ab;
            if det.abs() < 1e-10 {
                break;
            }
            let delta_a = (hess_bb * grad_a - hess_ab * grad_b) / det;
            let delta_b = (hess_aa * grad_b - hess_ab * grad_a) / det;

            a -= delta_a;
            b -= delta_b;

            if delta_a.abs() < self.tol && delta_b.abs() < self.tol {
                break;
            }
        }

        self.a = Some(a);
        self.b = Some(b);
        Ok(())
    }

    /// Positive-class probabilities for decision values
    pub fn transform(&self, decision: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = self.parameters().ok_or(TuneError::NotFitted)?;
        Ok(decision.mapv(|f| Self::sigmoid(a * f + b)))
    }

    /// Two-column probability surface, negative class first
    pub fn transform_proba(&self, decision: &Array1<f64>) -> Result<Array2<f64>> {
        let pos = self.transform(decision)?;
        let mut out = Array2::zeros((pos.len(), 2));
        for (i, &p) in pos.iter().enumerate() {
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = p;
        }
        Ok(out)
    }
}

impl Default for PlattCalibrator {
    fn default() -> Self {
        Self::new()
    }
}
