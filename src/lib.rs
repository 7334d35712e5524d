//! tunekit - Bayesian hyperparameter search and evaluation engine
//!
//! This crate tunes hyperparameters for arbitrary estimators:
//! - Typed search spaces with float, integer and categorical axes
//! - A Gaussian-process surrogate proposing candidates by expected
//!   improvement
//! - Budgeted search with iteration, wall-clock and convergence stops
//! - Holdout and cross-validated candidate scoring
//! - Winner promotion with probability calibration and resampled
//!   score spreads
//!
//! # Modules
//!
//! - [`search`] - search space, budget, surrogate and the search loop
//! - [`evaluate`] - fold planning, objective evaluation, resampling
//! - [`metrics`] - built-in and custom scoring metrics
//! - [`model`] - estimator traits plugged in by callers
//! - [`calibration`] - sigmoid probability calibration
//! - [`promotion`] - refitting and packaging the search winner
//!
//! # Example
//!
//! ```no_run
//! use tunekit::prelude::*;
//!
//! let space = SearchSpace::new()
//!     .add(Parameter::log_float("learning_rate", 1e-4, 1.0))
//!     .add(Parameter::int("depth", 2, 12));
//! let budget = SearchBudget::default().with_max_iterations(30).with_seed(7);
//!
//! let mut search = BayesSearch::new(space, budget, "mae").unwrap();
//! let mut objective = |params: &ParamVector| -> Result<f64> {
//!     let lr = params.get_float("learning_rate").unwrap_or(0.1);
//!     Ok((lr - 0.05).abs())
//! };
//! let report = search.run(&mut objective).unwrap();
//! println!("best {:?} = {}", report.best_params, report.best_score);
//! ```

pub mod error;

pub mod calibration;
pub mod evaluate;
pub mod metrics;
pub mod model;
pub mod promotion;
pub mod search;

pub use error::{Result, TuneError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, TuneError};

    pub use crate::search::{
        BayesSearch, EvalOutcome, EvaluationRecord, Objective, ParamKind, ParamValue,
        ParamVector, Parameter, SearchBudget, SearchReport, SearchSpace, TerminationReason,
    };

    pub use crate::evaluate::{resample, FoldPlanner, FoldScores, FoldStrategy, ObjectiveEvaluator};

    pub use crate::metrics::{Metric, MetricSpec};

    pub use crate::model::{Estimator, EstimatorFactory, FactoryFn, Task};

    pub use crate::calibration::PlattCalibrator;

    pub use crate::promotion::{promote, PromotedModel};
}
