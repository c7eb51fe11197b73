mod schema;

pub use schema::{Config, GrammarBackend, GrammarConfig, ProvidersConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::DEFAULT_PROVIDER_TIMEOUT;

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Get the config directory path (~/.config/intro-score/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("intro-score"))
}

/// Get the default config file path (~/.config/intro-score/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   and falls back to defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => match get_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("no config file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    tracing::debug!(path = %config_path.display(), "config loaded");
    Ok(config)
}

/// Validate config values that YAML parsing cannot check.
///
/// Returns every problem found, not just the first.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref timeout) = config.providers.timeout {
        match humantime::parse_duration(timeout) {
            Ok(d) if d.is_zero() => {
                errors.push("providers.timeout: must be greater than zero".to_string());
            }
            Ok(_) => {}
            Err(e) => errors.push(format!(
                "providers.timeout: invalid duration '{}' - {}",
                timeout, e
            )),
        }
    }

    let grammar = &config.providers.grammar;
    match (grammar.backend, grammar.url.as_deref()) {
        (GrammarBackend::Languagetool, None) => {
            errors.push("providers.grammar.url: required for the languagetool backend".to_string());
        }
        (GrammarBackend::Languagetool, Some(url))
            if !(url.starts_with("http://") || url.starts_with("https://")) =>
        {
            errors.push(format!(
                "providers.grammar.url: '{}' must start with http:// or https://",
                url
            ));
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Effective provider timeout. Call after `validate_config`.
pub fn provider_timeout(config: &Config) -> Duration {
    config
        .providers
        .timeout
        .as_deref()
        .and_then(|t| humantime::parse_duration(t).ok())
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT)
}
