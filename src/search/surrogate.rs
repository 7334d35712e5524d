//! Gaussian-process surrogate and candidate proposer
//!
//! The search loop talks to this module through a narrow contract: hand in
//! the observed (unit-encoded params, objective) pairs, get the next
//! candidate back. Objectives arrive on the minimize convention; the sign
//! handling for maximize metrics happens in the driver, not here.

use crate::search::{ParamVector, SearchSpace};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Kernel functions for the Gaussian process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Kernel {
    /// Squared exponential
    Rbf { length_scale: f64 },
    /// Matern family; nu in {0.5, 1.5, 2.5} has closed forms
    Matern { nu: f64, length_scale: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Matern {
            nu: 2.5,
            length_scale: 1.0,
        }
    }
}

fn kernel_value(x1: &[f64], x2: &[f64], kernel: &Kernel) -> f64 {
    let dist_sq: f64 = x1.iter().zip(x2.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    match kernel {
        Kernel::Rbf { length_scale } => (-0.5 * dist_sq / (length_scale * length_scale)).exp(),
        Kernel::Matern { nu, length_scale } => {
            let dist = dist_sq.sqrt();
            if dist < 1e-12 {
                return 1.0;
            }
            let r = dist / length_scale;
            if (*nu - 0.5).abs() < 1e-6 {
                (-r).exp()
            } else if (*nu - 1.5).abs() < 1e-6 {
                let s = 3.0_f64.sqrt() * r;
                (1.0 + s) * (-s).exp()
            } else if (*nu - 2.5).abs() < 1e-6 {
                let s = 5.0_f64.sqrt() * r;
                (1.0 + s + s * s / 3.0) * (-s).exp()
            } else {
                // No closed form for other nu; squared-exponential fallback
                (-0.5 * r * r).exp()
            }
        }
    }
}

/// Gaussian-process regressor over unit-cube inputs
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    kernel: Kernel,
    noise: f64,
    x_train: Option<Array2<f64>>,
    l_chol: Option<Array2<f64>>,
    alpha: Option<Array1<f64>>,
    y_mean: f64,
    y_std: f64,
}

impl GaussianProcess {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            noise: 1e-6,
            x_train: None,
            l_chol: None,
            alpha: None,
            y_mean: 0.0,
            y_std: 1.0,
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(1e-10);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.l_chol.is_some()
    }

    /// Fit on observed points; targets are normalized internally
    pub fn fit(&mut self, x: Array2<f64>, y: &Array1<f64>) {
        let n = y.len();

        self.y_mean = y.mean().unwrap_or(0.0);
        self.y_std = y.std(0.0);
        if self.y_std < 1e-10 {
            self.y_std = 1.0;
        }
        let y_norm: Array1<f64> = y.iter().map(|&v| (v - self.y_mean) / self.y_std).collect();

        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                k[[i, j]] = kernel_value(
                    x.row(i).as_slice().unwrap_or(&[]),
                    x.row(j).as_slice().unwrap_or(&[]),
                    &self.kernel,
                );
            }
            k[[i, i]] += self.noise;
        }

        let l = Self::cholesky(&k);
        let alpha = Self::solve_system(&l, &y_norm);

        self.x_train = Some(x);
        self.l_chol = Some(l);
        self.alpha = Some(alpha);
    }

    /// Posterior mean and variance at one point
    pub fn predict_one(&self, x: &[f64]) -> (f64, f64) {
        let (x_train, l, alpha) = match (&self.x_train, &self.l_chol, &self.alpha) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return (self.y_mean, self.y_std * self.y_std),
        };

        let n = x_train.nrows();
        let k_star: Array1<f64> = (0..n)
            .map(|i| kernel_value(x_train.row(i).as_slice().unwrap_or(&[]), x, &self.kernel))
            .collect();

        let mean = k_star.dot(alpha) * self.y_std + self.y_mean;

        let k_self = kernel_value(x, x, &self.kernel);
        let v = Self::solve_lower(l, &k_star);
        let var = (k_self - v.dot(&v)).max(1e-10) * self.y_std * self.y_std;

        (mean, var)
    }

    fn cholesky(a: &Array2<f64>) -> Array2<f64> {
        let n = a.nrows();
        let mut l = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;
                if i == j {
                    for k in 0..j {
                        sum += l[[j, k]] * l[[j, k]];
                    }
                    l[[j, j]] = (a[[j, j]] - sum).max(1e-10).sqrt();
                } else {
                    for k in 0..j {
                        sum += l[[i, k]] * l[[j, k]];
                    }
                    l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]].max(1e-10);
                }
            }
        }
        l
    }

    fn solve_lower(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
        let n = b.len();
        let mut x = Array1::zeros(n);
        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= l[[i, j]] * x[j];
            }
            x[i] = sum / l[[i, i]].max(1e-10);
        }
        x
    }

    fn solve_system(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
        let n = b.len();
        let y = Self::solve_lower(l, b);
        let mut x = Array1::zeros(n);
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= l[[j, i]] * x[j];
            }
            x[i] = sum / l[[i, i]].max(1e-10);
        }
        x
    }
}

/// Sequential proposer: fits the GP to observed objectives and picks the
/// candidate with the highest expected improvement under minimization
#[derive(Debug)]
pub struct GpProposer {
    rng: Xoshiro256PlusPlus,
    gp: GaussianProcess,
    /// Random candidates scored per proposal
    n_candidates: usize,
    /// Completed observations between surrogate refits
    refit_interval: usize,
    observations_at_fit: usize,
}

impl GpProposer {
    pub fn new(seed: u64, refit_interval: usize) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            gp: GaussianProcess::new(Kernel::default()),
            n_candidates: 500,
            refit_interval: refit_interval.max(1),
            observations_at_fit: 0,
        }
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.gp = GaussianProcess::new(kernel);
        self
    }

    pub fn with_n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n.max(1);
        self
    }

    /// Propose the next candidate given (unit-encoded params, objective)
    /// observations, objectives on the minimize convention
    pub fn propose(&mut self, space: &SearchSpace, observed: &[(Vec<f64>, f64)]) -> ParamVector {
        if observed.len() < 2 {
            return space.sample(&mut self.rng);
        }

        if !self.gp.is_fitted()
            || observed.len() - self.observations_at_fit >= self.refit_interval
        {
            let n = observed.len();
            let d = space.len();
            let mut x = Array2::zeros((n, d));
            let mut y = Array1::zeros(n);
            for (i, (unit, obj)) in observed.iter().enumerate() {
                for (j, &v) in unit.iter().enumerate() {
                    x[[i, j]] = v;
                }
                y[i] = *obj;
            }
            self.gp.fit(x, &y);
            self.observations_at_fit = n;
        }

        let best_y = observed
            .iter()
            .map(|(_, y)| *y)
            .fold(f64::INFINITY, f64::min);

        let mut best_candidate = space.sample(&mut self.rng);
        let mut best_acq = expected_improvement(
            &self.gp.predict_one(&space.to_unit(&best_candidate)),
            best_y,
        );

        for _ in 1..self.n_candidates {
            let candidate = space.sample(&mut self.rng);
            let acq = expected_improvement(
                &self.gp.predict_one(&space.to_unit(&candidate)),
                best_y,
            );
            if acq > best_acq {
                best_acq = acq;
                best_candidate = candidate;
            }
        }

        best_candidate
    }
}

/// Expected improvement below the incumbent, for a minimized objective
fn expected_improvement(posterior: &(f64, f64), best_y: f64) -> f64 {
    let (mean, var) = *posterior;
    let std = var.sqrt().max(1e-10);
    let improvement = best_y - mean;
    let z = improvement / std;
    improvement * normal_cdf(z) + std * normal_pdf(z)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Abramowitz and Stegun 7.1.26
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
