//! External feature providers.
//!
//! The engine only sees these traits. Implementations are built once at
//! startup and injected into [`crate::scoring::Engine`].

pub mod grammar;
pub mod languagetool;
pub mod sentiment;

pub use grammar::HeuristicGrammar;
pub use languagetool::LanguageToolClient;
pub use sentiment::VaderSentiment;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{GrammarBackend, GrammarConfig, DEFAULT_LANGUAGE};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{provider} timed out after {}ms", .after.as_millis())]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    #[error("{provider} unavailable: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },
}

/// Compound polarity of a text, in [-1, 1].
pub trait SentimentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn polarity<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<f64, ProviderError>>;
}

/// Number of grammar issues flagged in a text.
pub trait GrammarProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn issue_count<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, ProviderError>>;
}

/// Build the grammar provider selected in config.
///
/// Expects a config that already passed `validate_config`; a missing
/// LanguageTool URL falls back to the heuristic checker.
pub fn grammar_from_config(config: &GrammarConfig) -> Arc<dyn GrammarProvider> {
    match (config.backend, config.url.as_deref()) {
        (GrammarBackend::Languagetool, Some(url)) => {
            let language = config.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
            let client = LanguageToolClient::new(url, language);
            tracing::info!(
                endpoint = client.endpoint(),
                language,
                "using LanguageTool grammar checks"
            );
            Arc::new(client)
        }
        (GrammarBackend::Languagetool, None) => {
            tracing::warn!("languagetool backend without url, using heuristic grammar checks");
            Arc::new(HeuristicGrammar::new())
        }
        (GrammarBackend::Heuristic, _) => Arc::new(HeuristicGrammar::new()),
    }
}
