use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::metrics;
use super::text::Transcript;
use crate::providers::{GrammarProvider, ProviderError, SentimentProvider};
use crate::rubric::{Metric, MetricKind, Rubric};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub metric_name: String,
    pub metric_weight: f64,
    pub raw_score: f64,
    pub max_score: f64,
    pub normalized_score: f64,
    pub detail: String,  // e.g. "132.0 wpm", "ttr 0.82"
    pub degraded: bool,  // Provider failed; floor score substituted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionResult {
    pub criterion_name: String,
    pub criterion_weight: f64,
    pub criterion_score: f64,
    pub metrics: Vec<MetricResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub overall_score: f64,
    pub total_words: usize,
    pub criteria: Vec<CriterionResult>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
}

impl ScoreBreakdown {
    /// Result for a transcript with no words
    pub fn empty() -> Self {
        Self {
            overall_score: 0.0,
            total_words: 0,
            criteria: Vec::new(),
            incomplete: false,
        }
    }

    pub fn metrics(&self) -> impl Iterator<Item = &MetricResult> {
        self.criteria.iter().flat_map(|c| c.metrics.iter())
    }

    pub fn metric(&self, name: &str) -> Option<&MetricResult> {
        self.metrics()
            .find(|m| m.metric_name.eq_ignore_ascii_case(name))
    }
}

/// Rescale a raw score to the metric's weight. Zero when `max_score` is zero.
pub fn normalize(raw_score: f64, max_score: f64, weight: f64) -> f64 {
    if max_score > 0.0 {
        (raw_score / max_score) * weight
    } else {
        0.0
    }
}

struct Outcome {
    raw: f64,
    detail: String,
    degraded: bool,
}

impl Outcome {
    fn measured(raw: f64, detail: String) -> Self {
        Self {
            raw,
            detail,
            degraded: false,
        }
    }
}

/// Provider results for one scoring call, fetched on first use
#[derive(Default)]
struct Features {
    polarity: Option<Result<f64, ProviderError>>,
    issues: Option<Result<usize, ProviderError>>,
}

/// Scores transcripts against a validated rubric.
///
/// Holds no per-call state, so one engine can serve concurrent calls.
pub struct Engine {
    rubric: Arc<Rubric>,
    sentiment: Arc<dyn SentimentProvider>,
    grammar: Arc<dyn GrammarProvider>,
    timeout: Duration,
}

impl Engine {
    pub fn new(
        rubric: impl Into<Arc<Rubric>>,
        sentiment: Arc<dyn SentimentProvider>,
        grammar: Arc<dyn GrammarProvider>,
    ) -> Self {
        Self {
            rubric: rubric.into(),
            sentiment,
            grammar,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Per-call limit for each provider
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub async fn score(&self, transcript: &str, duration_seconds: Option<f64>) -> ScoreBreakdown {
        let text = Transcript::new(transcript);
        if text.is_empty() {
            debug!("empty transcript, returning zero breakdown");
            return ScoreBreakdown::empty();
        }

        let total_words = text.word_count();
        let mut features = Features::default();
        let mut overall_score = 0.0;
        let mut criteria = Vec::with_capacity(self.rubric.criteria().len());

        for criterion in self.rubric.criteria() {
            let mut criterion_score = 0.0;
            let mut results = Vec::with_capacity(criterion.metrics.len());

            for metric in &criterion.metrics {
                let outcome = self
                    .measure(metric, &text, duration_seconds, &mut features)
                    .await;
                let normalized = normalize(outcome.raw, metric.max_score, metric.weight);
                debug!(
                    metric = %metric.name,
                    raw = outcome.raw,
                    normalized,
                    detail = %outcome.detail,
                    "metric scored"
                );

                criterion_score += normalized;
                results.push(MetricResult {
                    metric_name: metric.name.clone(),
                    metric_weight: metric.weight,
                    raw_score: outcome.raw,
                    max_score: metric.max_score,
                    normalized_score: normalized,
                    detail: outcome.detail,
                    degraded: outcome.degraded,
                });
            }

            overall_score += criterion_score;
            criteria.push(CriterionResult {
                criterion_name: criterion.name.clone(),
                criterion_weight: criterion.total_weight,
                criterion_score,
                metrics: results,
            });
        }

        let incomplete = criteria
            .iter()
            .flat_map(|c| &c.metrics)
            .any(|m| m.degraded);

        ScoreBreakdown {
            overall_score,
            total_words,
            criteria,
            incomplete,
        }
    }

    async fn measure(
        &self,
        metric: &Metric,
        text: &Transcript<'_>,
        duration_seconds: Option<f64>,
        features: &mut Features,
    ) -> Outcome {
        let words = text.word_count();

        match metric.kind {
            MetricKind::Salutation => {
                let rules = metric.keyword_rules();
                match metrics::matched_tier(text, &rules) {
                    Some(tier) => Outcome::measured(
                        tier.score,
                        format!("matched '{}'", tier.scoring_criteria),
                    ),
                    None => Outcome::measured(0.0, "no salutation found".to_string()),
                }
            }
            MetricKind::KeywordPresence => {
                let rules = metric.keyword_rules();
                let detail = rules
                    .iter()
                    .map(|rule| {
                        let (matched, total) = metrics::keyword_coverage(text, rule);
                        format!("{} {}/{}", rule.scoring_criteria, matched, total)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Outcome::measured(metrics::keyword_presence(text, &rules), detail)
            }
            MetricKind::Flow => {
                let raw = metrics::flow(text);
                let detail = if raw > 0.0 {
                    "order followed"
                } else {
                    "order not followed"
                };
                Outcome::measured(raw, detail.to_string())
            }
            MetricKind::SpeechRate => {
                let detail = match metrics::words_per_minute(words, duration_seconds) {
                    Some(wpm) => format!("{:.1} wpm", wpm),
                    None => "duration unknown".to_string(),
                };
                Outcome::measured(metrics::speech_rate(words, duration_seconds), detail)
            }
            MetricKind::GrammarErrors => match self.issue_count(text, features).await {
                Ok(issues) => Outcome::measured(
                    metrics::grammar(issues, words),
                    format!(
                        "{} issues, {:.1} per 100 words",
                        issues,
                        metrics::errors_per_hundred(issues, words)
                    ),
                ),
                Err(e) => degraded(metric, metrics::GRAMMAR_FLOOR, e),
            },
            MetricKind::VocabularyRichness => Outcome::measured(
                metrics::vocabulary(text),
                format!("ttr {:.2}", metrics::type_token_ratio(text)),
            ),
            MetricKind::FillerWordRate => Outcome::measured(
                metrics::filler_words(text),
                format!(
                    "{} fillers, {:.1}%",
                    metrics::filler_count(text),
                    metrics::filler_rate(text)
                ),
            ),
            MetricKind::Sentiment => {
                if text.is_empty() {
                    return Outcome::measured(0.0, "empty transcript".to_string());
                }
                match self.polarity(text, features).await {
                    Ok(polarity) => Outcome::measured(
                        metrics::sentiment(polarity),
                        format!("polarity {:.2}", polarity),
                    ),
                    Err(e) => degraded(metric, metrics::SENTIMENT_FLOOR, e),
                }
            }
        }
    }

    async fn polarity(
        &self,
        text: &Transcript<'_>,
        features: &mut Features,
    ) -> Result<f64, ProviderError> {
        if let Some(cached) = &features.polarity {
            return cached.clone();
        }

        let provider = self.sentiment.name();
        let call = self.sentiment.polarity(text.raw());
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(p)) if p.is_nan() => Err(ProviderError::InvalidResponse {
                provider,
                reason: "polarity is NaN".to_string(),
            }),
            Ok(Ok(p)) => Ok(p.clamp(-1.0, 1.0)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout {
                provider,
                after: self.timeout,
            }),
        };

        features.polarity = Some(result.clone());
        result
    }

    async fn issue_count(
        &self,
        text: &Transcript<'_>,
        features: &mut Features,
    ) -> Result<usize, ProviderError> {
        if let Some(cached) = &features.issues {
            return cached.clone();
        }

        let provider = self.grammar.name();
        let call = self.grammar.issue_count(text.raw());
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider,
                after: self.timeout,
            }),
        };

        features.issues = Some(result.clone());
        result
    }
}

fn degraded(metric: &Metric, floor: f64, error: ProviderError) -> Outcome {
    warn!(metric = %metric.name, error = %error, "provider failed, using floor score");
    Outcome {
        raw: floor,
        detail: error.to_string(),
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::{load_rubric, parse_rubric};
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCENARIO: &str = "Good morning everyone my name is Alex my age is 13 my class is 8th \
                            my school is Green Valley my place is Delhi closing thank you";

    struct FixedSentiment(f64);

    impl SentimentProvider for FixedSentiment {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn polarity<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<f64, ProviderError>> {
            Box::pin(futures::future::ready(Ok(self.0)))
        }
    }

    struct FixedGrammar(usize);

    impl GrammarProvider for FixedGrammar {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn issue_count<'a>(
            &'a self,
            _text: &'a str,
        ) -> BoxFuture<'a, Result<usize, ProviderError>> {
            Box::pin(futures::future::ready(Ok(self.0)))
        }
    }

    struct FailingGrammar;

    impl GrammarProvider for FailingGrammar {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn issue_count<'a>(
            &'a self,
            _text: &'a str,
        ) -> BoxFuture<'a, Result<usize, ProviderError>> {
            Box::pin(futures::future::ready(Err(ProviderError::Unavailable {
                provider: "failing",
                reason: "connection refused".to_string(),
            })))
        }
    }

    struct SlowSentiment;

    impl SentimentProvider for SlowSentiment {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn polarity<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<f64, ProviderError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(1.0)
            })
        }
    }

    #[derive(Default)]
    struct CountingSentiment {
        calls: AtomicUsize,
    }

    impl SentimentProvider for CountingSentiment {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn polarity<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<f64, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(futures::future::ready(Ok(0.8)))
        }
    }

    fn engine(polarity: f64, issues: usize) -> Engine {
        Engine::new(
            load_rubric(None).unwrap(),
            Arc::new(FixedSentiment(polarity)),
            Arc::new(FixedGrammar(issues)),
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[tokio::test]
    async fn test_scenario_breakdown() {
        let result = engine(0.8, 0).score(SCENARIO, Some(60.0)).await;

        assert_eq!(result.total_words, 27);
        assert_eq!(result.metric("Flow").unwrap().raw_score, 5.0);
        assert_eq!(result.metric("Speech Rate (WPM)").unwrap().raw_score, 2.0);
        assert_eq!(result.metric("Speech Rate (WPM)").unwrap().detail, "27.0 wpm");
        assert_eq!(result.metric("Salutation Level").unwrap().raw_score, 4.0);
        assert_close(result.metric("Keyword Presence").unwrap().raw_score, 16.0);
        assert_eq!(result.metric("Vocabulary Richness").unwrap().raw_score, 10.0);
        assert_eq!(result.metric("Filler Word Rate").unwrap().raw_score, 15.0);
        assert_eq!(result.metric("Grammar Errors").unwrap().raw_score, 10.0);
        assert_eq!(result.metric("Sentiment").unwrap().raw_score, 15.0);

        // 25 + 2 + 20 + 15 + 15
        assert_close(result.overall_score, 77.0);
        assert_close(result.criteria[0].criterion_score, 25.0);
        assert!(!result.incomplete);
    }

    #[tokio::test]
    async fn test_criteria_follow_rubric_order() {
        let engine = engine(0.8, 0);
        let result = engine.score(SCENARIO, None).await;
        let names: Vec<&str> = result
            .criteria
            .iter()
            .map(|c| c.criterion_name.as_str())
            .collect();
        let expected: Vec<&str> = engine
            .rubric()
            .criteria()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, expected);
        assert_eq!(result.metrics().count(), 8);
    }

    #[tokio::test]
    async fn test_empty_transcript() {
        let engine = engine(0.8, 0);
        for input in ["", "   ", "\n\t"] {
            for duration in [None, Some(60.0), Some(0.0)] {
                assert_eq!(engine.score(input, duration).await, ScoreBreakdown::empty());
            }
        }

        let json = serde_json::to_value(engine.score("", Some(60.0)).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "overall_score": 0.0, "total_words": 0, "criteria": [] })
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_providers() {
        let sentiment = Arc::new(CountingSentiment::default());
        let engine = Engine::new(
            load_rubric(None).unwrap(),
            sentiment.clone(),
            Arc::new(FixedGrammar(0)),
        );
        engine.score("  ", None).await;
        assert_eq!(sentiment.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let engine = engine(0.6, 3);
        let first = engine.score(SCENARIO, Some(12.0)).await;
        let second = engine.score(SCENARIO, Some(12.0)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_metric() {
        let engine = Engine::new(
            load_rubric(None).unwrap(),
            Arc::new(FixedSentiment(0.8)),
            Arc::new(FailingGrammar),
        );
        let result = engine.score(SCENARIO, Some(60.0)).await;

        let grammar = result.metric("Grammar Errors").unwrap();
        assert_eq!(grammar.raw_score, metrics::GRAMMAR_FLOOR);
        assert!(grammar.degraded);
        assert!(grammar.detail.contains("connection refused"));
        assert!(result.incomplete);
        // Everything else still measured
        assert_eq!(result.metrics().count(), 8);
        assert_eq!(result.metrics().filter(|m| m.degraded).count(), 1);
        assert_close(result.overall_score, 77.0 - 8.0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["incomplete"], true);
    }

    #[tokio::test]
    async fn test_provider_timeout_degrades_metric() {
        let engine = Engine::new(
            load_rubric(None).unwrap(),
            Arc::new(SlowSentiment),
            Arc::new(FixedGrammar(0)),
        )
        .with_timeout(Duration::from_millis(20));
        let result = engine.score(SCENARIO, Some(60.0)).await;

        let sentiment = result.metric("Sentiment").unwrap();
        assert_eq!(sentiment.raw_score, metrics::SENTIMENT_FLOOR);
        assert!(sentiment.degraded);
        assert!(sentiment.detail.contains("timed out"));
        assert!(result.incomplete);
    }

    #[tokio::test]
    async fn test_polarity_out_of_range_is_clamped() {
        let result = engine(3.0, 0).score(SCENARIO, None).await;
        let sentiment = result.metric("Sentiment").unwrap();
        assert_eq!(sentiment.raw_score, 15.0);
        assert_eq!(sentiment.detail, "polarity 1.00");
    }

    #[tokio::test]
    async fn test_provider_called_once_per_score() {
        let yaml = r#"
criteria:
  - name: Warmth
    total_weight: 15
    metrics:
      - { name: Sentiment, weight: 15, max_score: 15 }
  - name: Energy
    total_weight: 15
    metrics:
      - { name: Sentiment, weight: 15, max_score: 15 }
"#;
        let sentiment = Arc::new(CountingSentiment::default());
        let engine = Engine::new(
            parse_rubric(yaml, "test").unwrap(),
            sentiment.clone(),
            Arc::new(FixedGrammar(0)),
        );
        let result = engine.score("I love it", None).await;
        assert_eq!(sentiment.calls.load(Ordering::SeqCst), 1);
        assert_close(result.overall_score, 30.0);
    }

    #[tokio::test]
    async fn test_normalization_uses_weight_and_max() {
        let yaml = r#"
criteria:
  - name: Content
    total_weight: 15
    metrics:
      - name: Keyword Presence
        weight: 15
        max_score: 30
        rules:
          - { scoring_criteria: Must have, keywords: [name, age, school, class, family], score: 20 }
          - { scoring_criteria: Good to have, keywords: [hobbies, dream], score: 10 }
"#;
        let engine = Engine::new(
            parse_rubric(yaml, "test").unwrap(),
            Arc::new(FixedSentiment(0.0)),
            Arc::new(FixedGrammar(0)),
        );
        let result = engine.score(SCENARIO, None).await;
        let metric = result.metric("keyword presence").unwrap();
        assert_close(metric.raw_score, 16.0);
        assert_close(metric.normalized_score, 8.0);
        assert_close(result.overall_score, 8.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 10.0, 20.0), 10.0);
        assert_eq!(normalize(0.0, 10.0, 20.0), 0.0);
        assert_eq!(normalize(5.0, 0.0, 20.0), 0.0);
    }

    #[tokio::test]
    async fn test_raw_scores_within_bounds() {
        let engine = engine(-0.4, 40);
        let samples = [
            SCENARIO,
            "um uh like so um uh",
            "Hi! I am excited to introduce myself, feeling great. My name is Sam.",
            "word",
        ];
        for sample in samples {
            for duration in [None, Some(2.0), Some(30.0), Some(600.0)] {
                let result = engine.score(sample, duration).await;
                for metric in result.metrics() {
                    assert!(
                        metric.raw_score >= 0.0 && metric.raw_score <= metric.max_score,
                        "{} out of bounds: {}",
                        metric.metric_name,
                        metric.raw_score
                    );
                    assert!(metric.normalized_score <= metric.metric_weight + 1e-9);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_overall_monotonic_in_single_metric() {
        let low = engine(0.55, 0).score(SCENARIO, None).await;
        let high = engine(0.9, 0).score(SCENARIO, None).await;
        assert_eq!(low.metric("Sentiment").unwrap().raw_score, 12.0);
        assert_eq!(high.metric("Sentiment").unwrap().raw_score, 15.0);
        assert_close(high.overall_score - low.overall_score, 3.0);
    }

    #[tokio::test]
    async fn test_concurrent_scoring() {
        let engine = Arc::new(engine(0.8, 1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.score(SCENARIO, Some(20.0)).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
