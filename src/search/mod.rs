//! Hyperparameter search: domains, budgets, state, and the Bayesian loop
//!
//! The flow mirrors one search invocation: a [`SearchSpace`] declares the
//! domain, a [`SearchBudget`] encodes the stopping policy, [`BayesSearch`]
//! drives initial sampling and surrogate-guided proposals against an
//! [`Objective`], and the per-run bookkeeping lives in [`SearchState`].

mod budget;
mod driver;
mod space;
mod state;
pub mod surrogate;

pub use budget::SearchBudget;
pub use driver::{BayesSearch, Objective, SearchReport};
pub use space::{ParamKind, ParamValue, ParamVector, Parameter, SearchSpace};
pub use state::{
    BestSoFar, EvalOutcome, EvaluationRecord, SearchPhase, SearchState, TerminationReason,
    TrailWindow,
};
pub use surrogate::{GaussianProcess, GpProposer, Kernel};
