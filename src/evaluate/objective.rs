//! Candidate evaluation through holdout or cross-validated fitting

use crate::error::{Result, TuneError};
use crate::evaluate::cross_validation::{FoldPlanner, FoldSplit, FoldStrategy};
use crate::metrics::Metric;
use crate::model::{EstimatorFactory, Task};
use crate::search::{ParamVector, SearchBudget};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Scores hyperparameter candidates against a training set.
///
/// With `cv == 1` each candidate is fit once on a seeded shuffle split and
/// scored on the held-out part. With `cv > 1` the candidate is fit per fold
/// and the mean fold score is reported. The fold seed is fixed for the
/// lifetime of the evaluator so all candidates see identical splits.
pub struct ObjectiveEvaluator<'a, F: EstimatorFactory> {
    factory: &'a F,
    metric: Metric,
    task: Task,
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    cv: usize,
    holdout_fraction: f64,
    n_jobs: usize,
    seed: u64,
}

impl<'a, F: EstimatorFactory> ObjectiveEvaluator<'a, F> {
    pub fn new(
        factory: &'a F,
        metric: Metric,
        task: Task,
        x: &'a Array2<f64>,
        y: &'a Array1<f64>,
        budget: &SearchBudget,
    ) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(TuneError::Shape {
                expected: format!("{} target rows", x.nrows()),
                actual: format!("{}", y.len()),
            });
        }
        Ok(Self {
            factory,
            metric,
            task,
            x,
            y,
            cv: budget.cv,
            holdout_fraction: budget.holdout_fraction,
            n_jobs: budget.n_jobs,
            seed: budget.seed,
        })
    }

    /// Score one candidate on the metric's native convention.
    ///
    /// Slots into the search loop as a closure:
    /// `search.run(&mut |p| evaluator.evaluate(p))`.
    pub fn evaluate(&mut self, params: &ParamVector) -> Result<f64> {
        if self.cv <= 1 {
            self.holdout_score(params)
        } else {
            let scores = cross_val_scores(
                self.factory,
                params,
                self.task,
                &self.metric,
                self.x,
                self.y,
                self.cv,
                self.n_jobs,
                self.seed,
            )?;
            Ok(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    fn holdout_score(&self, params: &ParamVector) -> Result<f64> {
        let n = self.x.nrows();
        if n < 2 {
            return Err(TuneError::InvalidInput(format!(
                "holdout evaluation needs at least 2 samples, got {n}"
            )));
        }
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let n_val = ((n as f64 * self.holdout_fraction).round() as usize).clamp(1, n - 1);
        let (val_idx, train_idx) = indices.split_at(n_val);

        let mut estimator = self.factory.build(params)?;
        let x_train = self.x.select(Axis(0), train_idx);
        let y_train = self.y.select(Axis(0), train_idx);
        estimator
            .fit(&x_train, &y_train)
            .map_err(|e| TuneError::EvaluationFailed(e.to_string()))?;

        let x_val = self.x.select(Axis(0), val_idx);
        let y_val = self.y.select(Axis(0), val_idx);
        let pred = estimator
            .predict(&x_val)
            .map_err(|e| TuneError::EvaluationFailed(e.to_string()))?;
        Ok(self.metric.score(&y_val, &pred))
    }
}

fn score_fold<F: EstimatorFactory>(
    factory: &F,
    params: &ParamVector,
    metric: &Metric,
    x: &Array2<f64>,
    y: &Array1<f64>,
    split: &FoldSplit,
) -> Result<f64> {
    let mut estimator = factory.build(params)?;
    let x_train = x.select(Axis(0), &split.train_indices);
    let y_train = y.select(Axis(0), &split.train_indices);
    estimator
        .fit(&x_train, &y_train)
        .map_err(|e| TuneError::EvaluationFailed(e.to_string()))?;

    let x_test = x.select(Axis(0), &split.test_indices);
    let y_test = y.select(Axis(0), &split.test_indices);
    let pred = estimator
        .predict(&x_test)
        .map_err(|e| TuneError::EvaluationFailed(e.to_string()))?;
    Ok(metric.score(&y_test, &pred))
}

/// Per-fold native-convention scores for one candidate.
///
/// Folds are stratified for classification tasks. Fold fitting fans out over
/// a rayon scope when `n_jobs > 1`.
#[allow(clippy::too_many_arguments)]
pub fn cross_val_scores<F: EstimatorFactory>(
    factory: &F,
    params: &ParamVector,
    task: Task,
    metric: &Metric,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_splits: usize,
    n_jobs: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    let strategy = FoldStrategy::for_task(task, n_splits);
    let planner = FoldPlanner::new(strategy, seed);
    let splits = planner.split(x.nrows(), Some(y))?;

    if n_jobs > 1 {
        splits
            .par_iter()
            .map(|split| score_fold(factory, params, metric, x, y, split))
            .collect()
    } else {
        splits
            .iter()
            .map(|split| score_fold(factory, params, metric, x, y, split))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{CentroidFactory, FailingFactory, MeanFactory};
    use crate::search::{ParamValue, SearchBudget};
    use ndarray::{Array1, Array2};

    fn regression_data() -> (Array2<f64>, Array1<f64>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| 3.0 + (i % 5) as f64);
        (x, y)
    }

    fn classification_data() -> (Array2<f64>, Array1<f64>) {
        let n = 30;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if i < 20 { j as f64 } else { 10.0 + j as f64 }
        });
        let y = Array1::from_shape_fn(n, |i| if i < 20 { 0.0 } else { 1.0 });
        (x, y)
    }

    fn params(offset: f64) -> ParamVector {
        ParamVector::new().with("offset", ParamValue::Float(offset))
    }

    #[test]
    fn test_holdout_mae_prefers_zero_offset() {
        let (x, y) = regression_data();
        let factory = MeanFactory;
        let metric = Metric::resolve("mae").unwrap();
        let budget = SearchBudget::default();
        let mut evaluator =
            ObjectiveEvaluator::new(&factory, metric, Task::Regression, &x, &y, &budget)
                .unwrap();

        let at_zero = evaluator.evaluate(&params(0.0)).unwrap();
        let shifted = evaluator.evaluate(&params(5.0)).unwrap();
        assert!(at_zero < shifted);
    }

    #[test]
    fn test_cv_scores_deterministic() {
        let (x, y) = regression_data();
        let factory = MeanFactory;
        let metric = Metric::resolve("mse").unwrap();
        let budget = SearchBudget::default().with_cv(4).with_seed(9);
        let mut a = ObjectiveEvaluator::new(
            &factory,
            metric.clone(),
            Task::Regression,
            &x,
            &y,
            &budget,
        )
        .unwrap();
        let mut b =
            ObjectiveEvaluator::new(&factory, metric, Task::Regression, &x, &y, &budget)
                .unwrap();

        let p = params(1.0);
        assert_eq!(a.evaluate(&p).unwrap(), b.evaluate(&p).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = classification_data();
        let factory = CentroidFactory;
        let metric = Metric::resolve("f1").unwrap();
        let p = ParamVector::new().with("shrink", ParamValue::Float(0.1));

        let seq = cross_val_scores(
            &factory,
            &p,
            Task::Classification,
            &metric,
            &x,
            &y,
            3,
            1,
            5,
        )
        .unwrap();
        let par = cross_val_scores(
            &factory,
            &p,
            Task::Classification,
            &metric,
            &x,
            &y,
            3,
            4,
            5,
        )
        .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_fit_failure_becomes_evaluation_failed() {
        let (x, y) = regression_data();
        let factory = FailingFactory;
        let metric = Metric::resolve("mae").unwrap();
        let budget = SearchBudget::default();
        let mut evaluator =
            ObjectiveEvaluator::new(&factory, metric, Task::Regression, &x, &y, &budget)
                .unwrap();

        let err = evaluator.evaluate(&params(0.0)).unwrap_err();
        assert!(matches!(err, TuneError::EvaluationFailed(_)));
    }

    #[test]
    fn test_holdout_rejects_undersized_dataset() {
        let factory = MeanFactory;
        let metric = Metric::resolve("mae").unwrap();
        let budget = SearchBudget::default();
        for n in [0, 1] {
            let x = Array2::zeros((n, 2));
            let y = Array1::zeros(n);
            let mut evaluator = ObjectiveEvaluator::new(
                &factory,
                metric.clone(),
                Task::Regression,
                &x,
                &y,
                &budget,
            )
            .unwrap();
            let err = evaluator.evaluate(&params(0.0)).unwrap_err();
            assert!(matches!(err, TuneError::InvalidInput(_)), "n = {n}");
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = Array2::zeros((10, 2));
        let y = Array1::zeros(9);
        let factory = MeanFactory;
        let metric = Metric::resolve("mae").unwrap();
        let budget = SearchBudget::default();
        let result =
            ObjectiveEvaluator::new(&factory, metric, Task::Regression, &x, &y, &budget);
        assert!(matches!(result, Err(TuneError::Shape { .. })));
    }
}
