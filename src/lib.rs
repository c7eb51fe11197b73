pub mod config;
pub mod logging;
pub mod output;
pub mod providers;
pub mod rubric;
pub mod scoring;
