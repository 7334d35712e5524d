//! Candidate scoring: fold planning, objective evaluation and resampling

mod cross_validation;
mod objective;
mod resampling;

pub use cross_validation::{FoldPlanner, FoldScores, FoldSplit, FoldStrategy};
pub use objective::{cross_val_scores, ObjectiveEvaluator};
pub use resampling::resample;
