use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

use crate::rubric::{Rubric, Rule};
use crate::scoring::{MetricResult, ScoreBreakdown};

// Name column width in the text report (fits "Speech Rate (WPM)" with room)
const NAME_WIDTH: usize = 26;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a point value with one decimal ("77.0", "4.5")
/// If incomplete is true, appends asterisk to indicate a degraded score
pub fn format_score(score: f64, incomplete: bool) -> String {
    if incomplete {
        format!("{:.1}*", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Format a score breakdown as a human-readable report
///
/// One header line with the overall score, then one block per criterion
/// with a line per metric: raw/max, weighted points, and the measured detail.
pub fn format_report(breakdown: &ScoreBreakdown, use_colors: bool) -> String {
    if breakdown.criteria.is_empty() {
        return "No words to score. Overall: 0.0".to_string();
    }

    let possible: f64 = breakdown.criteria.iter().map(|c| c.criterion_weight).sum();
    let overall = format!(
        "{}/{}",
        format_score(breakdown.overall_score, breakdown.incomplete),
        trim_points(possible)
    );
    let words = format!("({} words)", breakdown.total_words);

    let mut lines = Vec::new();
    if use_colors {
        lines.push(format!("Overall: {} {}", overall.bold(), words.dimmed()));
    } else {
        lines.push(format!("Overall: {} {}", overall, words));
    }

    for criterion in &breakdown.criteria {
        lines.push(String::new());
        let heading = format!(
            "{:<width$}{}/{}",
            criterion.criterion_name,
            format_score(criterion.criterion_score, false),
            trim_points(criterion.criterion_weight),
            width = NAME_WIDTH + 2
        );
        if use_colors {
            lines.push(heading.bold().to_string());
        } else {
            lines.push(heading);
        }

        for metric in &criterion.metrics {
            lines.push(format_metric_line(metric, use_colors));
        }
    }

    if breakdown.incomplete {
        lines.push(String::new());
        let note = "* provider unavailable; floor score used";
        if use_colors {
            lines.push(note.yellow().to_string());
        } else {
            lines.push(note.to_string());
        }
    }

    lines.join("\n")
}

fn format_metric_line(metric: &MetricResult, use_colors: bool) -> String {
    let raw = format!(
        "{}/{}",
        trim_points(metric.raw_score),
        trim_points(metric.max_score)
    );
    let points = format!(
        "{}/{}",
        format_score(metric.normalized_score, metric.degraded),
        trim_points(metric.metric_weight)
    );
    let name = format!("{:<width$}", metric.metric_name, width = NAME_WIDTH);

    if use_colors {
        let points = if metric.degraded {
            points.yellow().to_string()
        } else {
            points.bold().to_string()
        };
        format!(
            "  {}{:>7}  {:>9}  {}",
            name,
            raw,
            points,
            metric.detail.dimmed()
        )
    } else {
        format!("  {}{:>7}  {:>9}  {}", name, raw, points, metric.detail)
    }
}

/// Format a validated rubric: criteria, metrics, and their rules
pub fn format_rubric(rubric: &Rubric, use_colors: bool) -> String {
    let mut lines = Vec::new();

    for (idx, criterion) in rubric.criteria().iter().enumerate() {
        if idx > 0 {
            lines.push(String::new());
        }
        let heading = format!(
            "{} ({})",
            criterion.name,
            trim_points(criterion.total_weight)
        );
        if use_colors {
            lines.push(heading.bold().to_string());
        } else {
            lines.push(heading);
        }

        for metric in &criterion.metrics {
            let summary = format!(
                "weight {}, max {}",
                trim_points(metric.weight),
                trim_points(metric.max_score)
            );
            if use_colors {
                lines.push(format!("  {} {}", metric.name.cyan(), summary.dimmed()));
            } else {
                lines.push(format!("  {} {}", metric.name, summary));
            }

            for rule in &metric.rules {
                lines.push(format_rule_line(rule, use_colors));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Total: {}", trim_points(rubric.total_weight())));
    lines.join("\n")
}

fn format_rule_line(rule: &Rule, use_colors: bool) -> String {
    let score = format!("{:>4}", trim_points(rule.score()));
    let keywords = match rule {
        Rule::Keyword(keyword_rule) if !keyword_rule.keywords.is_empty() => {
            format!(" [{}]", keyword_rule.keywords.join(", "))
        }
        _ => String::new(),
    };

    if use_colors {
        format!(
            "    {}  {}{}",
            score.bold(),
            rule.scoring_criteria(),
            keywords.dimmed()
        )
    } else {
        format!("    {}  {}{}", score, rule.scoring_criteria(), keywords)
    }
}

/// Pretty-printed JSON for `--format json`
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Whole numbers without decimals ("40"), anything else with one ("7.5")
fn trim_points(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
