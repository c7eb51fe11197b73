use futures::future::BoxFuture;
use vader_sentiment::SentimentIntensityAnalyzer;

use super::{ProviderError, SentimentProvider};

const PROVIDER: &str = "vader-sentiment";

/// In-process VADER sentiment: the full rated lexicon with booster,
/// negation, "but" and punctuation-emphasis rules.
///
/// The polarity is VADER's `compound` score, already in [-1, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderSentiment;

impl VaderSentiment {
    pub fn new() -> Self {
        Self
    }

    pub fn compound(&self, text: &str) -> Result<f64, ProviderError> {
        let analyzer = SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        scores
            .get("compound")
            .copied()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: PROVIDER,
                reason: "missing compound score".to_string(),
            })
    }
}

impl SentimentProvider for VaderSentiment {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn polarity<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<f64, ProviderError>> {
        Box::pin(futures::future::ready(self.compound(text)))
    }
}
