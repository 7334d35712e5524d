//! Evaluation metrics and metric resolution
//!
//! Every metric the search engine consumes is resolved once into a
//! [`Metric`]: a named `(y_true, y_pred) -> f64` function plus a `minimize`
//! flag. All sign handling downstream consults the flag instead of
//! re-deriving the direction from the metric name.

mod scores;

pub use scores::{
    accuracy, f1, jaccard, log_loss, max_error, mean_absolute_error, mean_squared_error,
    mean_squared_log_error, precision, r2, recall, roc_auc, root_mean_squared_error,
};

use crate::error::{Result, TuneError};
use std::fmt;
use std::sync::Arc;

use ndarray::Array1;

/// Boxed scoring function shared by named and user-supplied metrics
pub type ScoreFn = Arc<dyn Fn(&Array1<f64>, &Array1<f64>) -> f64 + Send + Sync>;

/// Canonical metric table: name, function, whether lower is better
const METRICS: &[(&str, fn(&Array1<f64>, &Array1<f64>) -> f64, bool)] = &[
    ("accuracy", accuracy, false),
    ("precision", precision, false),
    ("recall", recall, false),
    ("f1", f1, false),
    ("jaccard", jaccard, false),
    ("roc_auc", roc_auc, false),
    ("r2", r2, false),
    ("mean_absolute_error", mean_absolute_error, true),
    ("mean_squared_error", mean_squared_error, true),
    ("root_mean_squared_error", root_mean_squared_error, true),
    ("mean_squared_log_error", mean_squared_log_error, true),
    ("max_error", max_error, true),
    ("log_loss", log_loss, true),
];

/// Acronyms accepted as shorthand for canonical names
const ACRONYMS: &[(&str, &str)] = &[
    ("acc", "accuracy"),
    ("auc", "roc_auc"),
    ("mae", "mean_absolute_error"),
    ("mse", "mean_squared_error"),
    ("rmse", "root_mean_squared_error"),
    ("msle", "mean_squared_log_error"),
    ("me", "max_error"),
    ("logloss", "log_loss"),
];

/// Metric specification accepted by [`Metric::resolve`]
#[derive(Clone)]
pub enum MetricSpec {
    /// Canonical name or acronym, resolved against the fixed tables
    Name(String),
    /// User-supplied scoring function
    Custom {
        name: String,
        func: ScoreFn,
        /// Whether higher values are better (defaults to true at the
        /// construction helpers)
        higher_is_better: bool,
    },
}

impl From<&str> for MetricSpec {
    fn from(name: &str) -> Self {
        MetricSpec::Name(name.to_string())
    }
}

impl From<String> for MetricSpec {
    fn from(name: String) -> Self {
        MetricSpec::Name(name)
    }
}

impl MetricSpec {
    /// Wrap a raw scoring function, assuming higher is better
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Array1<f64>, &Array1<f64>) -> f64 + Send + Sync + 'static,
    {
        MetricSpec::Custom {
            name: name.into(),
            func: Arc::new(func),
            higher_is_better: true,
        }
    }

    /// Wrap a raw loss function, where lower is better
    pub fn custom_loss<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Array1<f64>, &Array1<f64>) -> f64 + Send + Sync + 'static,
    {
        MetricSpec::Custom {
            name: name.into(),
            func: Arc::new(func),
            higher_is_better: false,
        }
    }
}

/// A resolved evaluation metric
///
/// Immutable once resolved. `minimize` is computed exactly once here and
/// consulted everywhere else.
#[derive(Clone)]
pub struct Metric {
    name: String,
    func: ScoreFn,
    minimize: bool,
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("minimize", &self.minimize)
            .finish()
    }
}

impl Metric {
    /// Resolve a metric specification into a usable metric
    ///
    /// Names are matched against the canonical table first, then the
    /// acronym table. Fails with [`TuneError::UnknownMetric`] when a string
    /// resolves in neither.
    pub fn resolve(spec: impl Into<MetricSpec>) -> Result<Self> {
        match spec.into() {
            MetricSpec::Name(raw) => {
                let lower = raw.to_lowercase();
                let canonical = ACRONYMS
                    .iter()
                    .find(|(acr, _)| *acr == lower)
                    .map(|(_, full)| *full)
                    .unwrap_or(lower.as_str());

                METRICS
                    .iter()
                    .find(|(name, _, _)| *name == canonical)
                    .map(|(name, func, minimize)| Metric {
                        name: name.to_string(),
                        func: Arc::new(*func),
                        minimize: *minimize,
                    })
                    .ok_or_else(|| TuneError::UnknownMetric {
                        name: raw,
                        available: METRICS
                            .iter()
                            .map(|(n, _, _)| *n)
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
            MetricSpec::Custom {
                name,
                func,
                higher_is_better,
            } => Ok(Metric {
                name,
                func,
                minimize: !higher_is_better,
            }),
        }
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether lower values are better
    pub fn minimize(&self) -> bool {
        self.minimize
    }

    /// Compute the score in the metric's native convention
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        (self.func)(y_true, y_pred)
    }

    /// Convert a native score into the optimizer-facing objective
    ///
    /// The search loop always minimizes its objective: minimize-oriented
    /// scores pass through unchanged, maximize-oriented scores are negated.
    /// This and [`Metric::native_score`] are the only two sign-handling
    /// points in the crate.
    pub fn objective_value(&self, score: f64) -> f64 {
        if self.minimize {
            score
        } else {
            -score
        }
    }

    /// Convert an optimizer-facing objective back into a native score
    pub fn native_score(&self, objective: f64) -> f64 {
        if self.minimize {
            objective
        } else {
            -objective
        }
    }

    /// Whether `candidate` strictly improves on `best` in the native
    /// convention. Ties are not improvements, so the earlier record wins.
    pub fn is_improvement(&self, candidate: f64, best: f64) -> bool {
        if self.minimize {
            candidate < best
        } else {
            candidate > best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_resolve_canonical_name() {
        let metric = Metric::resolve("accuracy").unwrap();
        assert_eq!(metric.name(), "accuracy");
        assert!(!metric.minimize());
    }

    #[test]
    fn test_resolve_acronym() {
        let metric = Metric::resolve("mae").unwrap();
        assert_eq!(metric.name(), "mean_absolute_error");
        assert!(metric.minimize());

        let metric = Metric::resolve("auc").unwrap();
        assert_eq!(metric.name(), "roc_auc");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let metric = Metric::resolve("MAE").unwrap();
        assert_eq!(metric.name(), "mean_absolute_error");
    }

    #[test]
    fn test_unknown_metric() {
        let err = Metric::resolve("not_a_metric").unwrap_err();
        assert!(matches!(err, TuneError::UnknownMetric { .. }));
    }

    #[test]
    fn test_mae_scenario() {
        // Constant prediction [2,2,2,2] against [1,2,3,4] has MAE 1.0, and
        // the optimizer-facing value is 1.0 unchanged (already a loss).
        let metric = Metric::resolve("mae").unwrap();
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 2.0, 2.0];

        let score = metric.score(&y_true, &y_pred);
        assert_relative_eq!(score, 1.0);
        assert_relative_eq!(metric.objective_value(score), 1.0);
        assert_relative_eq!(metric.native_score(metric.objective_value(score)), 1.0);
    }

    #[test]
    fn test_f1_scenario() {
        // precision = 1.0, recall = 0.5 -> F1 = 2/3; optimizer sees -2/3
        let metric = Metric::resolve("f1").unwrap();
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];

        let score = metric.score(&y_true, &y_pred);
        assert_relative_eq!((score * 1e4).round() / 1e4, 0.6667);
        assert_relative_eq!(
            (metric.objective_value(score) * 1e4).round() / 1e4,
            -0.6667
        );
    }

    #[test]
    fn test_custom_metric_defaults_to_maximize() {
        let spec = MetricSpec::custom("negated_gap", |y_true: &Array1<f64>, y_pred: &Array1<f64>| {
            -(y_true - y_pred).mapv(f64::abs).sum()
        });
        let metric = Metric::resolve(spec).unwrap();
        assert!(!metric.minimize());

        let score = metric.score(&array![1.0, 2.0], &array![1.0, 3.0]);
        assert_relative_eq!(metric.objective_value(score), 1.0);
    }

    #[test]
    fn test_improvement_is_strict() {
        let loss = Metric::resolve("mse").unwrap();
        assert!(loss.is_improvement(0.4, 0.5));
        assert!(!loss.is_improvement(0.5, 0.5));

        let gain = Metric::resolve("f1").unwrap();
        assert!(gain.is_improvement(0.9, 0.8));
        assert!(!gain.is_improvement(0.8, 0.8));
    }
}
