//! Hyperparameter domains and sampled vectors

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of a search dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Continuous parameter, optionally sampled on a log scale
    Float { low: f64, high: f64, log_scale: bool },
    /// Discrete integer parameter
    Int { low: i64, high: i64, log_scale: bool },
    /// Finite set of named levels
    Categorical { choices: Vec<String> },
}

/// A sampled parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Categorical(String),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Categorical(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) => Some(v.round() as i64),
            ParamValue::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

/// One dimension of a search space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    /// Optional declared default, used as the single initial point when a
    /// search starts with one initial sample
    pub anchor: Option<ParamValue>,
}

impl Parameter {
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Float { low, high, log_scale: false },
            anchor: None,
        }
    }

    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Float { low, high, log_scale: true },
            anchor: None,
        }
    }

    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Int { low, high, log_scale: false },
            anchor: None,
        }
    }

    pub fn log_int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Int { low, high, log_scale: true },
            anchor: None,
        }
    }

    pub fn categorical(name: impl Into<String>, choices: Vec<&str>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Categorical {
                choices: choices.into_iter().map(String::from).collect(),
            },
            anchor: None,
        }
    }

    /// Set the declared default value
    pub fn with_anchor(mut self, value: ParamValue) -> Self {
        self.anchor = Some(value);
        self
    }

    /// Draw a uniform sample from the dimension's domain
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match &self.kind {
            ParamKind::Float { low, high, log_scale } => {
                let val = if *log_scale {
                    let (lo, hi) = (low.ln(), high.ln());
                    (rng.gen::<f64>() * (hi - lo) + lo).exp()
                } else {
                    rng.gen::<f64>() * (high - low) + low
                };
                ParamValue::Float(val.clamp(*low, *high))
            }
            ParamKind::Int { low, high, log_scale } => {
                let val = if *log_scale {
                    let (lo, hi) = ((*low as f64).ln(), (*high as f64).ln());
                    (rng.gen::<f64>() * (hi - lo) + lo).exp().round() as i64
                } else {
                    rng.gen_range(*low..=*high)
                };
                ParamValue::Int(val.clamp(*low, *high))
            }
            ParamKind::Categorical { choices } => {
                let idx = rng.gen_range(0..choices.len());
                ParamValue::Categorical(choices[idx].clone())
            }
        }
    }

    /// The declared anchor value, falling back to the domain midpoint
    pub fn anchor_value(&self) -> ParamValue {
        if let Some(anchor) = &self.anchor {
            return anchor.clone();
        }
        match &self.kind {
            ParamKind::Float { low, high, log_scale } => {
                let mid = if *log_scale {
                    (low.ln() + (high.ln() - low.ln()) / 2.0).exp()
                } else {
                    low + (high - low) / 2.0
                };
                ParamValue::Float(mid)
            }
            ParamKind::Int { low, high, .. } => ParamValue::Int(low + (high - low) / 2),
            ParamKind::Categorical { choices } => ParamValue::Categorical(choices[0].clone()),
        }
    }

    /// Whether a value lies inside the declared domain
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (&self.kind, value) {
            (ParamKind::Float { low, high, .. }, ParamValue::Float(v)) => v >= low && v <= high,
            (ParamKind::Int { low, high, .. }, ParamValue::Int(v)) => v >= low && v <= high,
            (ParamKind::Categorical { choices }, ParamValue::Categorical(v)) => {
                choices.iter().any(|c| c == v)
            }
            _ => false,
        }
    }

    /// Encode a value onto `[0, 1]`, respecting log scaling
    pub fn to_unit(&self, value: &ParamValue) -> f64 {
        match (&self.kind, value) {
            (ParamKind::Float { low, high, log_scale }, ParamValue::Float(v)) => {
                if *log_scale {
                    ((v.ln() - low.ln()) / (high.ln() - low.ln())).clamp(0.0, 1.0)
                } else if high > low {
                    ((v - low) / (high - low)).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            (ParamKind::Int { low, high, log_scale }, ParamValue::Int(v)) => {
                if *log_scale {
                    let (lo, hi) = ((*low as f64).ln(), (*high as f64).ln());
                    (((*v as f64).ln() - lo) / (hi - lo)).clamp(0.0, 1.0)
                } else if high > low {
                    ((*v - *low) as f64 / (*high - *low) as f64).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            (ParamKind::Categorical { choices }, ParamValue::Categorical(v)) => {
                if choices.len() < 2 {
                    return 0.0;
                }
                let idx = choices.iter().position(|c| c == v).unwrap_or(0);
                idx as f64 / (choices.len() - 1) as f64
            }
            _ => 0.0,
        }
    }
}

/// Ordered hyperparameter vector: name to sampled value
///
/// Order matches domain declaration order and is stable under serde
/// round-trips, so unit encodings are comparable across a search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamVector {
    entries: Vec<(String, ParamValue)>,
}

impl ParamVector {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.entries.push((name.into(), value));
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declared search domain: an ordered list of dimensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self { parameters: Vec::new() }
    }

    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float(name, low, high))
    }

    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_float(name, low, high))
    }

    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int(name, low, high))
    }

    pub fn categorical(self, name: impl Into<String>, choices: Vec<&str>) -> Self {
        self.add(Parameter::categorical(name, choices))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Draw one uniform sample per dimension, in declaration order
    pub fn sample(&self, rng: &mut impl Rng) -> ParamVector {
        let mut vector = ParamVector::new();
        for p in &self.parameters {
            vector.push(p.name.clone(), p.sample(rng));
        }
        vector
    }

    /// The domain's anchor point (declared defaults, midpoints otherwise)
    pub fn anchor(&self) -> ParamVector {
        let mut vector = ParamVector::new();
        for p in &self.parameters {
            vector.push(p.name.clone(), p.anchor_value());
        }
        vector
    }

    /// Whether every entry of `vector` lies inside its declared dimension
    pub fn contains(&self, vector: &ParamVector) -> bool {
        self.parameters.iter().all(|p| {
            vector
                .get(&p.name)
                .map(|v| p.contains(v))
                .unwrap_or(false)
        })
    }

    /// Encode a vector onto the unit cube, in declaration order
    pub fn to_unit(&self, vector: &ParamVector) -> Vec<f64> {
        self.parameters
            .iter()
            .map(|p| {
                vector
                    .get(&p.name)
                    .map(|v| p.to_unit(v))
                    .unwrap_or(0.5)
            })
            .collect()
    }

    /// Euclidean distance between two vectors in unit-cube coordinates
    pub fn unit_distance(&self, a: &ParamVector, b: &ParamVector) -> f64 {
        self.to_unit(a)
            .iter()
            .zip(self.to_unit(b).iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}
