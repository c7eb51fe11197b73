use std::path::PathBuf;
use thiserror::Error;

use super::model::MetricKind;

/// A single problem found while validating a rubric.
///
/// `path` values use the file layout, e.g. `criteria[0].metrics[2].weight`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RubricError {
    #[error("rubric defines no criteria")]
    Empty,

    #[error("{path}: criterion '{criterion}' has no metrics")]
    NoMetrics { path: String, criterion: String },

    #[error("{path}: missing required field")]
    MissingField { path: String },

    #[error("{path}: must be a non-negative finite number, got {value}")]
    InvalidNumber { path: String, value: f64 },

    #[error("{path}: duplicate name '{name}'")]
    DuplicateName { path: String, name: String },

    #[error("{path}: no scorer for metric '{metric}' in criterion '{criterion}'")]
    UnknownMetric {
        path: String,
        criterion: String,
        metric: String,
    },

    #[error("{path}: metric weights sum to {metric_sum}, expected total_weight {total_weight}")]
    WeightMismatch {
        path: String,
        total_weight: f64,
        metric_sum: f64,
    },

    #[error("{path}: {kind} scorer can return up to {ceiling}, above max_score {max_score}")]
    CeilingExceeded {
        path: String,
        kind: MetricKind,
        ceiling: f64,
        max_score: f64,
    },

    #[error("{path}: {reason}")]
    RuleShape { path: String, reason: String },
}

/// Failure to obtain a usable rubric. Always fatal for the caller.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read rubric at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rubric {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("rubric {origin} has {} error(s)", errors.len())]
    Invalid {
        origin: String,
        errors: Vec<RubricError>,
    },
}

impl LoadError {
    /// Individual validation problems, if that is why loading failed
    pub fn validation_errors(&self) -> &[RubricError] {
        match self {
            LoadError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}
