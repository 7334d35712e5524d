//! Fold construction for cross-validated evaluation

use crate::error::{Result, TuneError};
use crate::model::Task;
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Fold construction rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FoldStrategy {
    /// Plain k-fold over shuffled indices
    KFold { n_splits: usize },
    /// K-fold preserving each class's proportion across folds
    StratifiedKFold { n_splits: usize },
}

impl FoldStrategy {
    /// The rule a task calls for: stratified folds for classification,
    /// plain k-fold for regression
    pub fn for_task(task: Task, n_splits: usize) -> Self {
        match task {
            Task::Classification => FoldStrategy::StratifiedKFold { n_splits },
            Task::Regression => FoldStrategy::KFold { n_splits },
        }
    }
}

/// One train/test index split
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Seeded fold splitter
///
/// The seed is fixed per search so every hyperparameter candidate is
/// evaluated on identical folds.
pub struct FoldPlanner {
    strategy: FoldStrategy,
    seed: u64,
}

impl FoldPlanner {
    pub fn new(strategy: FoldStrategy, seed: u64) -> Self {
        Self { strategy, seed }
    }

    /// Generate the train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<FoldSplit>> {
        match &self.strategy {
            FoldStrategy::KFold { n_splits } => self.k_fold(n_samples, *n_splits),
            FoldStrategy::StratifiedKFold { n_splits } => {
                let y = y.ok_or_else(|| {
                    TuneError::InvalidInput(
                        "stratified k-fold requires the target array".to_string(),
                    )
                })?;
                self.stratified_k_fold(y, *n_splits)
            }
        }
    }

    fn check(&self, n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(TuneError::InvalidInput(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(TuneError::InvalidInput(format!(
                "n_samples ({n_samples}) must be >= n_splits ({n_splits})"
            )));
        }
        Ok(())
    }

    fn k_fold(&self, n_samples: usize, n_splits: usize) -> Result<Vec<FoldSplit>> {
        self.check(n_samples, n_splits)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;
        for fold_idx in 0..n_splits {
            let base = n_samples / n_splits;
            let fold_size = if fold_idx < n_samples % n_splits {
                base + 1
            } else {
                base
            };

            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(FoldSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold(&self, y: &Array1<f64>, n_splits: usize) -> Result<Vec<FoldSplit>> {
        self.check(y.len(), n_splits)?;

        // Group sample indices by class label, in label order so the fold
        // assignment is independent of sample order
        let mut class_indices: Vec<(i64, Vec<usize>)> = Vec::new();
        for (idx, &val) in y.iter().enumerate() {
            let class = val.round() as i64;
            match class_indices.iter_mut().find(|(c, _)| *c == class) {
                Some((_, v)) => v.push(idx),
                None => class_indices.push((class, vec![idx])),
            }
        }
        class_indices.sort_by_key(|(c, _)| *c);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for (_, indices) in class_indices.iter_mut() {
            indices.shuffle(&mut rng);
        }

        // Deal round-robin across folds to preserve proportions. The cursor
        // continues from class to class so folds fill evenly when a class
        // holds fewer samples than there are folds.
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut cursor = 0;
        for (_, indices) in &class_indices {
            for &idx in indices {
                folds[cursor].push(idx);
                cursor = (cursor + 1) % n_splits;
            }
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                FoldSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Per-fold scores with derived mean and spread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl FoldScores {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}
