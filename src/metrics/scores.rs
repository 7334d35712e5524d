//! Scoring functions over true/predicted target arrays
//!
//! Classification functions treat targets as class labels encoded as f64
//! and binarize at 0.5 where a positive class is needed. All functions share
//! the `(y_true, y_pred) -> f64` signature so they can sit in one table.

use ndarray::Array1;

/// Clip for probabilities entering a logarithm
const EPS: f64 = 1e-15;

fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (*t > 0.5, *p > 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

/// Fraction of correctly predicted labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t.round() == p.round())
        .count();
    correct as f64 / y_true.len() as f64
}

/// Positive-class precision: tp / (tp + fp)
pub fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, _, _) = confusion_counts(y_true, y_pred);
    if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    }
}

/// Positive-class recall: tp / (tp + fn)
pub fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, _, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_) as f64
    }
}

/// Harmonic mean of precision and recall
pub fn f1(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Jaccard similarity of the positive class: tp / (tp + fp + fn)
pub fn jaccard(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp + fn_) as f64
    }
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic
///
/// `y_pred` may be hard labels or continuous scores; ties share ranks.
pub fn roc_auc(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    // Rank predictions, averaging ranks over ties
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| y_pred[a].partial_cmp(&y_pred[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_pred[order[j + 1]] == y_pred[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();

    (rank_sum_pos - n_pos as f64 * (n_pos as f64 + 1.0) / 2.0) / (n_pos as f64 * n_neg as f64)
}

/// Coefficient of determination
pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

/// Mean absolute error
pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n
}

/// Mean squared error
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

/// Root mean squared error
pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

/// Mean squared logarithmic error; inputs are clamped at zero
pub fn mean_squared_log_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| ((1.0 + t.max(0.0)).ln() - (1.0 + p.max(0.0)).ln()).powi(2))
        .sum::<f64>()
        / n
}

/// Largest absolute residual
pub fn max_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .fold(0.0, f64::max)
}

/// Binary cross-entropy, with `y_pred` read as P(class = 1)
pub fn log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if *t > 0.5 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum::<f64>()
        / n
}
