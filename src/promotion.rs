//! Winner promotion: refit the chosen candidate on the full training set
//!
//! Promotion is a pure function of the inputs, so running it twice for the
//! same winner replaces the previous promoted model with an identical one.

use crate::calibration::PlattCalibrator;
use crate::error::{Result, TuneError};
use crate::model::{Estimator, EstimatorFactory, Task};
use crate::search::ParamVector;
use ndarray::{Array1, Array2};
use tracing::{info, warn};

/// A search winner refit on all training data, with test-set predictions
/// and, for classifiers, a probability surface.
pub struct PromotedModel {
    pub params: ParamVector,
    pub estimator: Box<dyn Estimator>,
    pub task: Task,
    /// Point predictions on the held-out test set
    pub predictions: Array1<f64>,
    /// Per-class probabilities on the test set, classification only
    pub probabilities: Option<Array2<f64>>,
    /// Sigmoid calibrator, present when the estimator has no native
    /// probability output
    pub calibrator: Option<PlattCalibrator>,
    /// True when the calibrator was fit on the same test split the
    /// probabilities are reported for
    pub calibrated_on_test_data: bool,
}

impl PromotedModel {
    /// Point predictions for new data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.estimator.predict(x)
    }

    /// Class probabilities for new data, native when available and
    /// calibrated otherwise
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimator.supports_proba() {
            return self.estimator.predict_proba(x);
        }
        match &self.calibrator {
            Some(cal) => {
                let decision = self.estimator.predict(x)?;
                cal.transform_proba(&decision)
            }
            None => Err(TuneError::InvalidInput(
                "promoted model has no probability surface".to_string(),
            )),
        }
    }
}

/// Refit a fresh estimator for the winning hyperparameters on the full
/// training set and score it out on the test set.
///
/// Classification winners without native probabilities get a Platt
/// calibrator fit on the test split itself. That reuses evaluation data
/// and biases the probabilities optimistic; it is reported through
/// [`PromotedModel::calibrated_on_test_data`] and a warning event, never
/// an error.
pub fn promote<F: EstimatorFactory>(
    factory: &F,
    params: &ParamVector,
    task: Task,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<PromotedModel> {
    let mut estimator = factory.build(params)?;
    estimator
        .fit(x_train, y_train)
        .map_err(|e| TuneError::EvaluationFailed(e.to_string()))?;

    let predictions = estimator.predict(x_test)?;

    let mut calibrator = None;
    let mut calibrated_on_test_data = false;
    let probabilities = match task {
        Task::Regression => None,
        Task::Classification if estimator.supports_proba() => {
            Some(estimator.predict_proba(x_test)?)
        }
        Task::Classification => {
            warn!(
                n_test = y_test.len(),
                "probability_calibration_reuses_test_split"
            );
            let mut cal = PlattCalibrator::new();
            cal.fit(&predictions, y_test)?;
            let proba = cal.transform_proba(&predictions)?;
            calibrator = Some(cal);
            calibrated_on_test_data = true;
            Some(proba)
        }
    };

    info!(
        n_train = y_train.len(),
        n_test = y_test.len(),
        calibrated = calibrated_on_test_data,
        "winner_promoted"
    );

    Ok(PromotedModel {
        params: params.clone(),
        estimator,
        task,
        predictions,
        probabilities,
        calibrator,
        calibrated_on_test_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{CentroidFactory, MeanFactory};
    use crate::search::ParamValue;
    use ndarray::{Array1, Array2};

    fn classification_data() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x_train = Array2::from_shape_fn((20, 2), |(i, j)| {
            if i < 10 { j as f64 } else { 8.0 + j as f64 }
        });
        let y_train = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });
        let x_test = Array2::from_shape_fn((6, 2), |(i, j)| {
            if i < 3 { j as f64 } else { 8.0 + j as f64 }
        });
        let y_test = Array1::from_shape_fn(6, |i| if i < 3 { 0.0 } else { 1.0 });
        (x_train, y_train, x_test, y_test)
    }

    #[test]
    fn test_regression_promotion_has_no_probabilities() {
        let x_train = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let y_train = Array1::from_shape_fn(10, |i| i as f64);
        let x_test = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y_test = Array1::from_shape_fn(4, |i| i as f64);

        let params = ParamVector::new().with("offset", ParamValue::Float(0.0));
        let promoted = promote(
            &MeanFactory,
            &params,
            Task::Regression,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )
        .unwrap();

        assert!(promoted.estimator.is_fitted());
        assert_eq!(promoted.predictions.len(), 4);
        assert!(promoted.probabilities.is_none());
        assert!(promoted.calibrator.is_none());
        assert!(!promoted.calibrated_on_test_data);
    }

    #[test]
    fn test_classifier_without_proba_gets_calibrated() {
        let (x_train, y_train, x_test, y_test) = classification_data();
        let params = ParamVector::new().with("shrink", ParamValue::Float(0.0));

        let promoted = promote(
            &CentroidFactory,
            &params,
            Task::Classification,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )
        .unwrap();

        assert!(promoted.calibrated_on_test_data);
        assert!(promoted.calibrator.is_some());
        let proba = promoted.probabilities.as_ref().unwrap();
        assert_eq!(proba.dim(), (6, 2));
        for row in proba.rows() {
            assert!((row[0] + row[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_promotion_is_idempotent() {
        let (x_train, y_train, x_test, y_test) = classification_data();
        let params = ParamVector::new().with("shrink", ParamValue::Float(0.1));

        let first = promote(
            &CentroidFactory,
            &params,
            Task::Classification,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )
        .unwrap();
        let second = promote(
            &CentroidFactory,
            &params,
            Task::Classification,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )
        .unwrap();

        assert_eq!(first.predictions, second.predictions);
        assert_eq!(
            first.probabilities.as_ref().unwrap(),
            second.probabilities.as_ref().unwrap()
        );
    }

    #[test]
    fn test_predict_proba_on_new_data() {
        let (x_train, y_train, x_test, y_test) = classification_data();
        let params = ParamVector::new().with("shrink", ParamValue::Float(0.0));

        let promoted = promote(
            &CentroidFactory,
            &params,
            Task::Classification,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )
        .unwrap();

        let fresh = Array2::from_shape_fn((2, 2), |(i, j)| if i == 0 { j as f64 } else { 8.0 + j as f64 });
        let proba = promoted.predict_proba(&fresh).unwrap();
        // First row resembles class 0, second class 1
        assert!(proba[[0, 0]] > proba[[0, 1]]);
        assert!(proba[[1, 1]] > proba[[1, 0]]);
    }
}
