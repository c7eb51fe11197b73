use serde::{Deserialize, Serialize};

/// Rubric file as written on disk.
///
/// Numeric fields are optional here so that a missing `total_weight`,
/// `weight` or `max_score` reaches validation and is reported by path,
/// instead of being defaulted to zero.
///
/// Example YAML:
/// ```yaml
/// criteria:
///   - name: Speech Rate
///     total_weight: 10
///     metrics:
///       - name: Speech Rate (WPM)
///         weight: 10
///         max_score: 10
///         rules:
///           - { scoring_criteria: "111-140 wpm", score: 10 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RubricFile {
    #[serde(default)]
    pub criteria: Vec<CriterionFile>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CriterionFile {
    pub name: String,

    #[serde(default)]
    pub total_weight: Option<f64>,

    #[serde(default)]
    pub metrics: Vec<MetricFile>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricFile {
    /// Display name; also selects the scorer (case-insensitive)
    pub name: String,

    #[serde(default)]
    pub weight: Option<f64>,

    #[serde(default)]
    pub max_score: Option<f64>,

    #[serde(default)]
    pub rules: Vec<RuleFile>,
}

/// A single scoring tier.
///
/// `keywords` is only meaningful for keyword-driven metrics; banded metrics
/// must leave it out.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    pub scoring_criteria: String,

    #[serde(default)]
    pub keywords: Option<Vec<String>>,

    pub score: f64,
}
