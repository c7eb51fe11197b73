pub mod engine;
pub mod metrics;
pub mod text;

pub use engine::{
    normalize, CriterionResult, Engine, MetricResult, ScoreBreakdown, DEFAULT_PROVIDER_TIMEOUT,
};
pub use text::Transcript;
