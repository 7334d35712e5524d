//! Per-invocation search state
//!
//! One [`SearchState`] is created at the start of a search run and discarded
//! (or archived into the report) at termination. It is never shared across
//! concurrent searches; two concurrent searches on the same logical model
//! slot are unsupported caller behavior.

use crate::metrics::Metric;
use crate::search::ParamVector;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Number of trailing scores kept for convergence inspection and progress
/// callbacks
const TRAIL_CAPACITY: usize = 15;

/// Result of one evaluation: a native-convention score, or a failure marker
/// that no numeric score can be mistaken for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvalOutcome {
    Score(f64),
    Failed(String),
}

/// One optimization step, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Count of completed evaluations at assignment time
    pub index: usize,
    pub params: ParamVector,
    pub outcome: EvalOutcome,
}

impl EvaluationRecord {
    pub fn score(&self) -> Option<f64> {
        match &self.outcome {
            EvalOutcome::Score(s) => Some(*s),
            EvalOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, EvalOutcome::Failed(_))
    }
}

/// Why a search terminated; all three are successful terminations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The two most recent proposals were closer than the epsilon budget
    Converged,
    /// The proposal count reached `max_iterations`
    Exhausted,
    /// Wall-clock time reached `max_time_seconds`
    TimedOut,
}

/// Loop phase, visible for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Init,
    SamplingInitial,
    Proposing,
    Evaluating,
    Terminated(TerminationReason),
}

/// Bounded ring buffer of trailing scores and their consecutive deltas
#[derive(Debug, Clone)]
pub struct TrailWindow {
    scores: VecDeque<f64>,
    deltas: VecDeque<f64>,
    capacity: usize,
}

impl TrailWindow {
    fn new(capacity: usize) -> Self {
        Self {
            scores: VecDeque::with_capacity(capacity),
            deltas: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, score: f64) {
        if let Some(&last) = self.scores.back() {
            if self.deltas.len() == self.capacity {
                self.deltas.pop_front();
            }
            self.deltas.push_back((score - last).abs());
        }
        if self.scores.len() == self.capacity {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.iter().copied()
    }

    pub fn deltas(&self) -> impl Iterator<Item = f64> + '_ {
        self.deltas.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Running best result
#[derive(Debug, Clone)]
pub struct BestSoFar {
    pub index: usize,
    pub params: ParamVector,
    /// Native-convention score
    pub score: f64,
}

/// Mutable state owned exclusively by one search invocation
#[derive(Debug)]
pub struct SearchState {
    pub phase: SearchPhase,
    records: Vec<EvaluationRecord>,
    n_proposals: usize,
    started: Instant,
    best: Option<BestSoFar>,
    window: TrailWindow,
    /// Unit-cube encodings of the two most recent proposals
    last_proposals: VecDeque<Vec<f64>>,
    /// Last recovered failure message, used to deduplicate log writes
    /// within this run only
    last_failure: Option<String>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            phase: SearchPhase::Init,
            records: Vec::new(),
            n_proposals: 0,
            started: Instant::now(),
            best: None,
            window: TrailWindow::new(TRAIL_CAPACITY),
            last_proposals: VecDeque::with_capacity(2),
            last_failure: None,
        }
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn n_evaluations(&self) -> usize {
        self.records.len()
    }

    pub fn n_failed(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    pub fn n_proposals(&self) -> usize {
        self.n_proposals
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn best(&self) -> Option<&BestSoFar> {
        self.best.as_ref()
    }

    pub fn window(&self) -> &TrailWindow {
        &self.window
    }

    /// Append a successful evaluation and update the running best.
    /// Strict improvement only: a tie keeps the earlier record.
    pub fn record_score(&mut self, params: ParamVector, score: f64, metric: &Metric) {
        let index = self.records.len();
        let improved = match &self.best {
            None => true,
            Some(best) => metric.is_improvement(score, best.score),
        };
        if improved {
            self.best = Some(BestSoFar {
                index,
                params: params.clone(),
                score,
            });
        }
        self.window.push(score);
        self.records.push(EvaluationRecord {
            index,
            params,
            outcome: EvalOutcome::Score(score),
        });
    }

    /// Append a failed evaluation. Returns true when the message differs
    /// from the previous recovered failure, i.e. when it deserves a full
    /// log line.
    pub fn record_failure(&mut self, params: ParamVector, message: String) -> bool {
        let index = self.records.len();
        let fresh = self.last_failure.as_deref() != Some(message.as_str());
        self.last_failure = Some(message.clone());
        self.records.push(EvaluationRecord {
            index,
            params,
            outcome: EvalOutcome::Failed(message),
        });
        fresh
    }

    /// Remember a proposal's unit-cube encoding for the convergence check
    pub fn note_proposal(&mut self, unit: Vec<f64>) {
        if self.last_proposals.len() == 2 {
            self.last_proposals.pop_front();
        }
        self.last_proposals.push_back(unit);
        self.n_proposals += 1;
    }

    /// Euclidean distance between the two most recent proposals, once two
    /// exist
    pub fn proposal_distance(&self) -> Option<f64> {
        if self.last_proposals.len() < 2 {
            return None;
        }
        let a = &self.last_proposals[0];
        let b = &self.last_proposals[1];
        Some(
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
        )
    }

    /// Consume the state into its record history
    pub fn into_records(self) -> Vec<EvaluationRecord> {
        self.records
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}
