//! Shared toy estimators for the integration tests
#![allow(dead_code)]

use ndarray::{Array1, Array2};
use tunekit::prelude::*;

/// Ridge-style regressor on a single feature: predicts `slope * x`.
///
/// With targets generated as `y = 2x`, mean absolute error is minimal at
/// slope 2, so search quality is checkable analytically.
pub struct SlopeRegressor {
    pub slope: f64,
    fitted: bool,
}

impl SlopeRegressor {
    pub fn new(slope: f64) -> Self {
        Self {
            slope,
            fitted: false,
        }
    }
}

impl Estimator for SlopeRegressor {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(TuneError::NotFitted);
        }
        Ok(x.column(0).mapv(|v| self.slope * v))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

pub struct SlopeFactory;

impl EstimatorFactory for SlopeFactory {
    fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>> {
        let slope = params.get_float("slope").unwrap_or(0.0);
        Ok(Box::new(SlopeRegressor::new(slope)))
    }
}

/// Threshold classifier on the first feature: hard labels only, so
/// promotion exercises the calibration path.
pub struct ThresholdClassifier {
    pub threshold: f64,
    fitted: bool,
}

impl ThresholdClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            fitted: false,
        }
    }
}

impl Estimator for ThresholdClassifier {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(TuneError::NotFitted);
        }
        Ok(x.column(0)
            .mapv(|v| if v > self.threshold { 1.0 } else { 0.0 }))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

pub struct ThresholdFactory;

impl EstimatorFactory for ThresholdFactory {
    fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>> {
        let threshold = params.get_float("threshold").unwrap_or(0.5);
        Ok(Box::new(ThresholdClassifier::new(threshold)))
    }
}

/// Linearly separated two-class data on one informative feature
pub fn two_class_data(n_per_class: usize) -> (Array2<f64>, Array1<f64>) {
    let n = n_per_class * 2;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let base = if i < n_per_class { 0.0 } else { 4.0 };
        base + (i % 5) as f64 * 0.1 + j as f64 * 0.01
    });
    let y = Array1::from_shape_fn(n, |i| if i < n_per_class { 0.0 } else { 1.0 });
    (x, y)
}

/// Regression data with `y = 2x` on the first feature
pub fn slope_data(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 * 0.5);
    let y = x.column(0).mapv(|v| 2.0 * v);
    (x, y)
}
