//! Bayesian optimization loop
//!
//! Drives the sequential search: initial random design, surrogate-guided
//! proposals, budget enforcement, and running-best tracking. The loop always
//! minimizes its internal objective; maximize-oriented metrics are negated
//! exactly once on the way into the surrogate and re-negated once on the way
//! out.

use crate::error::{Result, TuneError};
use crate::metrics::{Metric, MetricSpec};
use crate::search::{
    EvaluationRecord, GpProposer, ParamVector, SearchBudget, SearchPhase, SearchSpace,
    SearchState, TerminationReason,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Black-box objective the loop repeatedly calls
///
/// Implemented for any `FnMut(&ParamVector) -> Result<f64>`;
/// [`crate::evaluate::ObjectiveEvaluator`] slots in through a closure over
/// its `evaluate` method. The returned score is on the metric's native
/// convention.
pub trait Objective {
    fn evaluate(&mut self, params: &ParamVector) -> Result<f64>;
}

impl<F> Objective for F
where
    F: FnMut(&ParamVector) -> Result<f64>,
{
    fn evaluate(&mut self, params: &ParamVector) -> Result<f64> {
        self(params)
    }
}

/// Outcome of a completed search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// Full evaluation history in completion order
    pub records: Vec<EvaluationRecord>,
    pub best_params: ParamVector,
    /// Best score, native metric convention
    pub best_score: f64,
    /// Index of the winning record
    pub best_index: usize,
    pub reason: TerminationReason,
    pub elapsed_seconds: f64,
    pub n_failed: usize,
}

impl SearchReport {
    /// Serialize the report for archival next to a model slot
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The Bayesian hyperparameter search loop
pub struct BayesSearch {
    space: SearchSpace,
    budget: SearchBudget,
    metric: Metric,
    callback: Option<Box<dyn FnMut(&[EvaluationRecord]) + Send>>,
}

impl BayesSearch {
    /// Initialize a search: validates the budget and resolves the metric.
    /// Both failure modes surface here, before any evaluation.
    pub fn new(
        space: SearchSpace,
        budget: SearchBudget,
        metric: impl Into<MetricSpec>,
    ) -> Result<Self> {
        budget.validate()?;
        let metric = Metric::resolve(metric)?;
        Ok(Self {
            space,
            budget,
            metric,
            callback: None,
        })
    }

    /// Register a per-evaluation progress callback receiving the running
    /// history. The loop works identically without one.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[EvaluationRecord]) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Run the search to termination
    ///
    /// Each invocation owns a fresh [`SearchState`]; re-running the same
    /// `BayesSearch` starts from scratch. Two concurrent searches feeding
    /// the same model slot are caller error and are not defended against.
    pub fn run<O: Objective>(&mut self, objective: &mut O) -> Result<SearchReport> {
        let mut state = SearchState::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.budget.seed);
        let mut proposer = GpProposer::new(
            self.budget.seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
            self.budget.batch_size,
        );

        // Initial design: pure random samples, or the domain anchor when a
        // single starting point is requested
        state.phase = SearchPhase::SamplingInitial;
        let initial: Vec<ParamVector> = if self.budget.initial_random_points <= 1 {
            vec![self.space.anchor()]
        } else {
            (0..self.budget.initial_random_points)
                .map(|_| self.space.sample(&mut rng))
                .collect()
        };

        let mut timed_out = false;
        for params in initial {
            debug!(params = ?params, "evaluation_started");
            // No viable baseline exists yet, so an initial failure aborts
            // the whole search
            let score = objective.evaluate(&params)?;
            if score.is_nan() {
                return Err(TuneError::EvaluationFailed(format!(
                    "initial point produced a NaN score for params {params:?}"
                )));
            }
            debug!(score, "evaluation_completed");
            state.record_score(params, score, &self.metric);
            if let Some(cb) = self.callback.as_mut() {
                cb(state.records());
            }
            if state.elapsed_seconds() >= self.budget.max_time_seconds {
                timed_out = true;
                break;
            }
        }

        let reason = if timed_out {
            TerminationReason::TimedOut
        } else {
            self.propose_loop(&mut state, &mut proposer, objective)?
        };
        state.phase = SearchPhase::Terminated(reason);

        let elapsed = state.elapsed_seconds();
        let n_failed = state.n_failed();
        let best = match state.best() {
            Some(best) => best.clone(),
            // Initial-phase failures abort before this point, so a completed
            // run always carries a best record. The guard keeps the error
            // contract explicit should that invariant ever move.
            None => {
                return Err(TuneError::AllCandidatesFailed {
                    n_evaluations: state.n_evaluations(),
                })
            }
        };

        info!(
            reason = ?reason,
            best_score = best.score,
            best_params = ?best.params,
            n_evaluations = state.n_evaluations(),
            "search_terminated"
        );

        Ok(SearchReport {
            records: state.into_records(),
            best_params: best.params,
            best_score: best.score,
            best_index: best.index,
            reason,
            elapsed_seconds: elapsed,
            n_failed,
        })
    }

    /// Surrogate-guided proposal phase; returns the termination reason
    fn propose_loop<O: Objective>(
        &mut self,
        state: &mut SearchState,
        proposer: &mut GpProposer,
        objective: &mut O,
    ) -> Result<TerminationReason> {
        loop {
            if state.n_proposals() >= self.budget.max_iterations {
                return Ok(TerminationReason::Exhausted);
            }

            state.phase = SearchPhase::Proposing;
            // Condition the surrogate on successful records only, with
            // scores flipped onto the minimize convention
            let observed: Vec<(Vec<f64>, f64)> = state
                .records()
                .iter()
                .filter_map(|r| {
                    r.score().map(|s| {
                        (
                            self.space.to_unit(&r.params),
                            self.metric.objective_value(s),
                        )
                    })
                })
                .collect();
            let candidate = proposer.propose(&self.space, &observed);
            state.note_proposal(self.space.to_unit(&candidate));

            state.phase = SearchPhase::Evaluating;
            debug!(params = ?candidate, "evaluation_started");
            match objective.evaluate(&candidate) {
                Ok(score) if !score.is_nan() => {
                    debug!(score, "evaluation_completed");
                    state.record_score(candidate, score, &self.metric);
                }
                Ok(_) => {
                    let message = "score is NaN".to_string();
                    if state.record_failure(candidate, message.clone()) {
                        warn!(error = %message, "evaluation_failed");
                    }
                }
                // A single degenerate candidate must not abort the search
                Err(TuneError::EvaluationFailed(message)) => {
                    if state.record_failure(candidate, message.clone()) {
                        warn!(error = %message, "evaluation_failed");
                    }
                }
                // Anything else (factory bugs, shape errors) propagates
                Err(err) => return Err(err),
            }

            if let Some(cb) = self.callback.as_mut() {
                cb(state.records());
            }

            if state.elapsed_seconds() >= self.budget.max_time_seconds {
                return Ok(TerminationReason::TimedOut);
            }
            if let Some(distance) = state.proposal_distance() {
                if distance < self.budget.min_improvement_epsilon {
                    return Ok(TerminationReason::Converged);
                }
            }
        }
    }
}
