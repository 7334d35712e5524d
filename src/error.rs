//! Error types for the tunekit search engine

use thiserror::Error;

/// Result type alias for tunekit operations
pub type Result<T> = std::result::Result<T, TuneError>;

/// Main error type for the search engine
#[derive(Error, Debug)]
pub enum TuneError {
    /// Malformed search budget. Raised during loop initialization, never
    /// mid-search.
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    /// A metric specification that resolves in neither the canonical table
    /// nor the acronym table.
    #[error("Unknown metric: {name}. Choose from: {available}")]
    UnknownMetric { name: String, available: String },

    /// A single candidate's fit or score computation failed. Recovered by
    /// the search loop for surrogate proposals, fatal for initial points.
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    /// Every evaluation in a completed search failed; no winner exists.
    #[error("All {n_evaluations} candidate evaluations failed")]
    AllCandidatesFailed { n_evaluations: usize },

    #[error("Estimator not fitted")]
    NotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for TuneError {
    fn from(err: serde_json::Error) -> Self {
        TuneError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TuneError {
    fn from(err: ndarray::ShapeError) -> Self {
        TuneError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
