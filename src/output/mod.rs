pub mod formatter;

pub use formatter::{format_report, format_rubric, format_score, should_use_colors, to_json};
