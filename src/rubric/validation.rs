use std::collections::HashSet;

use super::error::RubricError;
use super::model::{BandDescriptor, Criterion, KeywordRule, Metric, MetricKind, Rubric, Rule};
use super::schema::{CriterionFile, MetricFile, RubricFile, RuleFile};
use crate::scoring::metrics::ceiling;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Validate a parsed rubric file and build the typed [`Rubric`].
///
/// Collects every problem instead of stopping at the first one, so a broken
/// rubric can be fixed in a single pass.
pub fn validate_rubric(file: &RubricFile) -> Result<Rubric, Vec<RubricError>> {
    let mut errors = Vec::new();

    if file.criteria.is_empty() {
        return Err(vec![RubricError::Empty]);
    }

    let mut seen = HashSet::new();
    let mut criteria = Vec::with_capacity(file.criteria.len());

    for (i, criterion) in file.criteria.iter().enumerate() {
        let path = format!("criteria[{}]", i);
        check_name(&criterion.name, &path, &mut seen, &mut errors);
        if let Some(built) = validate_criterion(criterion, &path, &mut errors) {
            criteria.push(built);
        }
    }

    if errors.is_empty() {
        Ok(Rubric::new(criteria))
    } else {
        Err(errors)
    }
}

fn check_name(name: &str, path: &str, seen: &mut HashSet<String>, errors: &mut Vec<RubricError>) {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        errors.push(RubricError::MissingField {
            path: format!("{}.name", path),
        });
    } else if !seen.insert(key) {
        errors.push(RubricError::DuplicateName {
            path: format!("{}.name", path),
            name: name.to_string(),
        });
    }
}

fn validate_criterion(
    criterion: &CriterionFile,
    path: &str,
    errors: &mut Vec<RubricError>,
) -> Option<Criterion> {
    let total_weight = required_number(
        criterion.total_weight,
        &format!("{}.total_weight", path),
        errors,
    );

    if criterion.metrics.is_empty() {
        errors.push(RubricError::NoMetrics {
            path: format!("{}.metrics", path),
            criterion: criterion.name.clone(),
        });
        return None;
    }

    let mut seen = HashSet::new();
    let mut metrics = Vec::with_capacity(criterion.metrics.len());
    for (j, metric) in criterion.metrics.iter().enumerate() {
        let metric_path = format!("{}.metrics[{}]", path, j);
        check_name(&metric.name, &metric_path, &mut seen, errors);
        if let Some(built) = validate_metric(metric, &criterion.name, &metric_path, errors) {
            metrics.push(built);
        }
    }

    // Weight sum is only meaningful once every metric built cleanly
    let total_weight = total_weight?;
    if metrics.len() != criterion.metrics.len() {
        return None;
    }

    let metric_sum: f64 = metrics.iter().map(|m| m.weight).sum();
    if (metric_sum - total_weight).abs() > WEIGHT_TOLERANCE {
        errors.push(RubricError::WeightMismatch {
            path: format!("{}.total_weight", path),
            total_weight,
            metric_sum,
        });
        return None;
    }

    Some(Criterion {
        name: criterion.name.trim().to_string(),
        total_weight,
        metrics,
    })
}

fn validate_metric(
    metric: &MetricFile,
    criterion_name: &str,
    path: &str,
    errors: &mut Vec<RubricError>,
) -> Option<Metric> {
    let kind = MetricKind::from_name(&metric.name);
    if kind.is_none() {
        errors.push(RubricError::UnknownMetric {
            path: format!("{}.name", path),
            criterion: criterion_name.to_string(),
            metric: metric.name.clone(),
        });
    }

    let weight = required_number(metric.weight, &format!("{}.weight", path), errors);
    let max_score = required_number(metric.max_score, &format!("{}.max_score", path), errors);

    let kind = kind?;
    let rules = validate_rules(kind, &metric.rules, path, errors)?;
    let (weight, max_score) = (weight?, max_score?);

    let keyword_rules: Vec<&KeywordRule> = rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Keyword(keyword_rule) => Some(keyword_rule),
            Rule::Band(_) => None,
        })
        .collect();
    let ceiling = ceiling(kind, &keyword_rules);
    if ceiling > max_score + WEIGHT_TOLERANCE {
        errors.push(RubricError::CeilingExceeded {
            path: format!("{}.max_score", path),
            kind,
            ceiling,
            max_score,
        });
        return None;
    }

    Some(Metric {
        name: metric.name.trim().to_string(),
        kind,
        weight,
        max_score,
        rules,
    })
}

fn validate_rules(
    kind: MetricKind,
    rules: &[RuleFile],
    path: &str,
    errors: &mut Vec<RubricError>,
) -> Option<Vec<Rule>> {
    let error_count = errors.len();
    let mut built = Vec::with_capacity(rules.len());

    for (k, rule) in rules.iter().enumerate() {
        let rule_path = format!("{}.rules[{}]", path, k);
        let score = check_number(rule.score, &format!("{}.score", rule_path), errors);

        if kind.uses_keywords() {
            let keywords = normalize_keywords(rule.keywords.as_deref().unwrap_or_default());
            if rule
                .keywords
                .iter()
                .flatten()
                .any(|k| k.trim().is_empty())
            {
                errors.push(RubricError::RuleShape {
                    path: format!("{}.keywords", rule_path),
                    reason: "keywords must not be empty strings".to_string(),
                });
            }
            if let Some(score) = score {
                built.push(Rule::Keyword(KeywordRule {
                    scoring_criteria: rule.scoring_criteria.clone(),
                    keywords,
                    score,
                }));
            }
        } else {
            if rule.keywords.as_ref().is_some_and(|k| !k.is_empty()) {
                errors.push(RubricError::RuleShape {
                    path: format!("{}.keywords", rule_path),
                    reason: format!("keywords are not used by the {} metric", kind),
                });
            }
            if let Some(score) = score {
                built.push(Rule::Band(BandDescriptor {
                    scoring_criteria: rule.scoring_criteria.clone(),
                    score,
                }));
            }
        }
    }

    match kind {
        MetricKind::KeywordPresence => {
            let usable = rules
                .iter()
                .filter(|r| r.keywords.as_ref().is_some_and(|k| !k.is_empty()))
                .count();
            if rules.len() != 2 || usable != 2 {
                errors.push(RubricError::RuleShape {
                    path: format!("{}.rules", path),
                    reason: "keyword presence needs exactly two rules \
                             (must-have, good-to-have) with non-empty keywords"
                        .to_string(),
                });
            }
        }
        MetricKind::Salutation => {
            if !rules
                .iter()
                .any(|r| r.keywords.as_ref().is_some_and(|k| !k.is_empty()))
            {
                errors.push(RubricError::RuleShape {
                    path: format!("{}.rules", path),
                    reason: "salutation needs at least one rule with keywords".to_string(),
                });
            }
        }
        _ => {}
    }

    if errors.len() == error_count {
        Some(built)
    } else {
        None
    }
}

/// Lowercase, trim and dedupe, keeping first-seen order.
fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

fn required_number(value: Option<f64>, path: &str, errors: &mut Vec<RubricError>) -> Option<f64> {
    match value {
        Some(v) => check_number(v, path, errors),
        None => {
            errors.push(RubricError::MissingField {
                path: path.to_string(),
            });
            None
        }
    }
}

fn check_number(value: f64, path: &str, errors: &mut Vec<RubricError>) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        errors.push(RubricError::InvalidNumber {
            path: path.to_string(),
            value,
        });
        None
    }
}
