//! Estimator traits: the seam between the search engine and model code
//!
//! The engine never inspects an estimator beyond `fit`, `predict`, the
//! optional probability surface and the fitted-state probe. Concrete model
//! implementations live outside this crate and plug in through
//! [`EstimatorFactory`].

use crate::error::{Result, TuneError};
use crate::search::ParamVector;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Learning goal of a search run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    Classification,
    Regression,
}

impl Task {
    pub fn is_classification(&self) -> bool {
        matches!(self, Task::Classification)
    }
}

/// A fittable model instance
pub trait Estimator: Send + Sync {
    /// Fit on training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Point predictions for new data
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Per-class probabilities, one column per class
    ///
    /// Only meaningful when [`Estimator::supports_proba`] returns true;
    /// the default surface rejects the call.
    fn predict_proba(&self, _x: &Array2<f64>) -> Result<Array2<f64>> {
        Err(TuneError::InvalidInput(
            "estimator has no native probability output".to_string(),
        ))
    }

    /// Whether the estimator exposes native class probabilities
    fn supports_proba(&self) -> bool {
        false
    }

    /// Fitted-state probe
    fn is_fitted(&self) -> bool;
}

/// Builds a fresh, unfitted estimator for a hyperparameter vector
///
/// Errors from a factory propagate unchanged to the caller of the search.
pub trait EstimatorFactory: Send + Sync {
    fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>>;
}

/// Adapter turning a closure into an [`EstimatorFactory`]
pub struct FactoryFn<F>(pub F);

impl<F> EstimatorFactory for FactoryFn<F>
where
    F: Fn(&ParamVector) -> Result<Box<dyn Estimator>> + Send + Sync,
{
    fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>> {
        (self.0)(params)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Toy estimators shared by the unit tests

    use super::*;

    /// Predicts the training-set mean plus a fixed offset taken from the
    /// `offset` hyperparameter. MAE against a symmetric target is minimal
    /// at offset zero, which makes optima analytic.
    #[derive(Debug, Clone)]
    pub struct MeanRegressor {
        pub offset: f64,
        pub mean: Option<f64>,
    }

    impl MeanRegressor {
        pub fn new(offset: f64) -> Self {
            Self { offset, mean: None }
        }
    }

    impl Estimator for MeanRegressor {
        fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            if y.is_empty() {
                return Err(TuneError::InvalidInput("empty target".to_string()));
            }
            self.mean = Some(y.sum() / y.len() as f64);
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            let mean = self.mean.ok_or(TuneError::NotFitted)?;
            Ok(Array1::from_elem(x.nrows(), mean + self.offset))
        }

        fn is_fitted(&self) -> bool {
            self.mean.is_some()
        }
    }

    /// Classifies by distance to per-class feature centroids
    #[derive(Debug, Clone)]
    pub struct CentroidClassifier {
        pub shrink: f64,
        pub centroids: Option<Vec<(f64, Array1<f64>)>>,
    }

    impl CentroidClassifier {
        pub fn new(shrink: f64) -> Self {
            Self {
                shrink,
                centroids: None,
            }
        }
    }

    impl Estimator for CentroidClassifier {
        fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            let mut labels: Vec<f64> = y.iter().map(|v| v.round()).collect();
            labels.sort_by(|a, b| a.partial_cmp(b).unwrap());
            labels.dedup();

            let centroids = labels
                .iter()
                .map(|&label| {
                    let rows: Vec<usize> = y
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| v.round() == label)
                        .map(|(i, _)| i)
                        .collect();
                    let mut centroid = Array1::zeros(x.ncols());
                    for &r in &rows {
                        centroid = centroid + x.row(r).to_owned();
                    }
                    centroid *= (1.0 - self.shrink) / rows.len() as f64;
                    (label, centroid)
                })
                .collect();

            self.centroids = Some(centroids);
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            let centroids = self.centroids.as_ref().ok_or(TuneError::NotFitted)?;
            let preds = (0..x.nrows())
                .map(|i| {
                    let row = x.row(i);
                    centroids
                        .iter()
                        .map(|(label, c)| {
                            let d: f64 = row
                                .iter()
                                .zip(c.iter())
                                .map(|(a, b)| (a - b).powi(2))
                                .sum();
                            (*label, d)
                        })
                        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                        .map(|(label, _)| label)
                        .unwrap_or(0.0)
                })
                .collect();
            Ok(preds)
        }

        fn is_fitted(&self) -> bool {
            self.centroids.is_some()
        }
    }

    /// Builds [`MeanRegressor`] instances from the `offset` hyperparameter
    pub struct MeanFactory;

    impl EstimatorFactory for MeanFactory {
        fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>> {
            let offset = params.get_float("offset").unwrap_or(0.0);
            Ok(Box::new(MeanRegressor::new(offset)))
        }
    }

    /// Builds [`CentroidClassifier`] instances from the `shrink` hyperparameter
    pub struct CentroidFactory;

    impl EstimatorFactory for CentroidFactory {
        fn build(&self, params: &ParamVector) -> Result<Box<dyn Estimator>> {
            let shrink = params.get_float("shrink").unwrap_or(0.0);
            Ok(Box::new(CentroidClassifier::new(shrink)))
        }
    }

    /// Factory that always fails, for failure-path tests
    pub struct FailingFactory;

    impl EstimatorFactory for FailingFactory {
        fn build(&self, _params: &ParamVector) -> Result<Box<dyn Estimator>> {
            Err(TuneError::EvaluationFailed(
                "degenerate hyperparameter combination".to_string(),
            ))
        }
    }
}
