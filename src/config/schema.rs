use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application config.
///
/// Example YAML:
/// ```yaml
/// rubric: ./rubric.yaml
/// providers:
///   timeout: "5s"
///   grammar:
///     backend: languagetool
///     url: http://localhost:8081
///     language: en-US
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Rubric file; the built-in reference rubric when absent
    #[serde(default)]
    pub rubric: Option<PathBuf>,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Per-call provider timeout, humantime format ("500ms", "5s")
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub grammar: GrammarConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GrammarBackend {
    #[default]
    Heuristic,
    Languagetool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GrammarConfig {
    #[serde(default)]
    pub backend: GrammarBackend,

    /// LanguageTool server base URL (required for `languagetool`)
    #[serde(default)]
    pub url: Option<String>,

    /// Language code sent to LanguageTool (default: en-US)
    #[serde(default)]
    pub language: Option<String>,
}
