pub mod error;
pub mod model;
pub mod schema;
pub mod validation;

pub use error::{LoadError, RubricError};
pub use model::{BandDescriptor, Criterion, KeywordRule, Metric, MetricKind, Rubric, Rule};
pub use schema::{CriterionFile, MetricFile, RubricFile, RuleFile};
pub use validation::validate_rubric;

use std::fs;
use std::path::Path;

/// The built-in 100-point rubric used when no rubric file is configured
pub const REFERENCE_RUBRIC: &str = include_str!("reference.yaml");

/// Parse and validate rubric YAML. `origin` names the source in errors.
pub fn parse_rubric(yaml: &str, origin: &str) -> Result<Rubric, LoadError> {
    let file: RubricFile = serde_saphyr::from_str(yaml).map_err(|e| LoadError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    validate_rubric(&file).map_err(|errors| LoadError::Invalid {
        origin: origin.to_string(),
        errors,
    })
}

/// Load the rubric from `path`, or the built-in reference rubric if `None`.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The YAML cannot be parsed
/// - The rubric fails validation (every problem is listed)
pub fn load_rubric(path: Option<&Path>) -> Result<Rubric, LoadError> {
    let rubric = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_rubric(&content, &path.display().to_string())?
        }
        None => parse_rubric(REFERENCE_RUBRIC, "(built-in)")?,
    };

    tracing::debug!(
        criteria = rubric.criteria().len(),
        total_weight = rubric.total_weight(),
        "rubric loaded"
    );
    Ok(rubric)
}
