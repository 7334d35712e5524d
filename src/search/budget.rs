//! Search stopping policy and evaluation configuration

use crate::error::{Result, TuneError};
use serde::{Deserialize, Serialize};

/// Budget and evaluation policy for one search invocation
///
/// `max_iterations` counts surrogate-guided proposals after the initial
/// random design; zero disables Bayesian proposals entirely so only the
/// initial points are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Maximum surrogate-guided proposals (0 = initial design only)
    pub max_iterations: usize,
    /// Wall-clock ceiling in seconds, checked after each evaluation
    pub max_time_seconds: f64,
    /// Minimum unit-cube distance between the two most recent proposals
    /// before the loop may terminate by convergence
    pub min_improvement_epsilon: f64,
    /// Surrogate refit interval in completed evaluations
    pub batch_size: usize,
    /// Purely random samples taken before any surrogate proposal (>= 1)
    pub initial_random_points: usize,
    /// Validation fraction for holdout evaluation (`cv == 1`)
    pub holdout_fraction: f64,
    /// Evaluation mode: 1 = holdout split, > 1 = k-fold cross-validation
    pub cv: usize,
    /// Degree of per-fold parallelism inside one evaluation
    pub n_jobs: usize,
    /// Seed for the sampling, proposal, and fold RNGs
    pub seed: u64,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_time_seconds: f64::INFINITY,
            min_improvement_epsilon: 1e-8,
            batch_size: 1,
            initial_random_points: 5,
            holdout_fraction: 0.3,
            cv: 1,
            n_jobs: 1,
            seed: 1,
        }
    }
}

impl SearchBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_max_time_seconds(mut self, secs: f64) -> Self {
        self.max_time_seconds = secs;
        self
    }

    pub fn with_epsilon(mut self, eps: f64) -> Self {
        self.min_improvement_epsilon = eps;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_initial_random_points(mut self, n: usize) -> Self {
        self.initial_random_points = n;
        self
    }

    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    pub fn with_cv(mut self, cv: usize) -> Self {
        self.cv = cv;
        self
    }

    pub fn with_n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the budget. Called once at loop initialization; a budget
    /// rejected here never reaches the search loop.
    pub fn validate(&self) -> Result<()> {
        if self.max_time_seconds.is_nan() || self.max_time_seconds < 0.0 {
            return Err(TuneError::InvalidBudget(format!(
                "max_time_seconds must be a non-negative scalar, got {}",
                self.max_time_seconds
            )));
        }
        if self.min_improvement_epsilon.is_nan() || self.min_improvement_epsilon < 0.0 {
            return Err(TuneError::InvalidBudget(format!(
                "min_improvement_epsilon must be a non-negative scalar, got {}",
                self.min_improvement_epsilon
            )));
        }
        if self.initial_random_points < 1 {
            return Err(TuneError::InvalidBudget(
                "initial_random_points must be >= 1".to_string(),
            ));
        }
        if self.batch_size < 1 {
            return Err(TuneError::InvalidBudget(
                "batch_size must be >= 1".to_string(),
            ));
        }
        if self.cv < 1 {
            return Err(TuneError::InvalidBudget("cv must be >= 1".to_string()));
        }
        if self.cv == 1 && !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(TuneError::InvalidBudget(format!(
                "holdout_fraction must lie in (0, 1), got {}",
                self.holdout_fraction
            )));
        }
        if self.n_jobs < 1 {
            return Err(TuneError::InvalidBudget("n_jobs must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_is_valid() {
        assert!(SearchBudget::default().validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_is_valid() {
        // 0 disables Bayesian search; only initial points run
        let budget = SearchBudget::new()
            .with_max_iterations(0)
            .with_initial_random_points(1);
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_time() {
        let budget = SearchBudget::new().with_max_time_seconds(-1.0);
        assert!(matches!(
            budget.validate(),
            Err(TuneError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_rejects_nan_time() {
        let budget = SearchBudget::new().with_max_time_seconds(f64::NAN);
        assert!(budget.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_initial_points() {
        let budget = SearchBudget::new().with_initial_random_points(0);
        assert!(budget.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_holdout_fraction() {
        let budget = SearchBudget::new().with_cv(1).with_holdout_fraction(1.0);
        assert!(budget.validate().is_err());

        // The fraction is irrelevant under k-fold evaluation
        let budget = SearchBudget::new().with_cv(5).with_holdout_fraction(1.0);
        assert!(budget.validate().is_ok());
    }
}
