//! Per-metric scorers.
//!
//! Every scorer is a pure function from the transcript (plus duration or
//! provider output where needed) to a raw score. Scorers know nothing about
//! weights; the engine normalizes raw scores against the rubric.
//!
//! Banded metrics keep their thresholds here. The rubric rules for those
//! metrics only describe the bands.

use std::collections::HashSet;

use super::text::Transcript;
use crate::rubric::{KeywordRule, MetricKind};

pub const FLOW_FULL_SCORE: f64 = 5.0;

/// Greeting phrases, matched anywhere in the text
pub const GREETING_PHRASES: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "good day",
];

/// Greeting words, matched as whole tokens so "this" or "delhi" is no "hi"
pub const GREETING_WORDS: &[&str] = &["salutation", "hello", "hi", "hey", "greetings"];

/// Details that must all appear between greeting and closing
pub const REQUIRED_DETAILS: &[&str] = &["name", "age", "class", "school", "place"];

pub const CLOSING_MARKERS: &[&str] = &["closing", "thank you", "thanks"];

/// Matched as whole whitespace-separated tokens only
pub const FILLER_WORDS: &[&str] = &[
    "um", "uh", "like", "so", "actually", "basically", "right", "well", "kinda", "okay", "hmm",
    "ah",
];

pub const SPEECH_RATE_TOP: f64 = 10.0;
pub const GRAMMAR_TOP: f64 = 10.0;
pub const GRAMMAR_FLOOR: f64 = 2.0;
pub const VOCABULARY_TOP: f64 = 10.0;
pub const FILLER_TOP: f64 = 15.0;
pub const SENTIMENT_TOP: f64 = 15.0;
pub const SENTIMENT_FLOOR: f64 = 3.0;

/// Highest raw score the scorer for `kind` can return with these rules.
pub fn ceiling(kind: MetricKind, keyword_rules: &[&KeywordRule]) -> f64 {
    match kind {
        MetricKind::Salutation => keyword_rules
            .iter()
            .map(|r| r.score)
            .fold(0.0, f64::max),
        MetricKind::KeywordPresence => keyword_rules.iter().map(|r| r.score).sum(),
        MetricKind::Flow => FLOW_FULL_SCORE,
        MetricKind::SpeechRate => SPEECH_RATE_TOP,
        MetricKind::GrammarErrors => GRAMMAR_TOP,
        MetricKind::VocabularyRichness => VOCABULARY_TOP,
        MetricKind::FillerWordRate => FILLER_TOP,
        MetricKind::Sentiment => SENTIMENT_TOP,
    }
}

// --- Salutation ---

/// Best tier whose keywords appear in the transcript. Higher-scoring tiers
/// win even when a lower tier also matches; equal scores keep rubric order.
pub fn matched_tier<'r>(text: &Transcript, rules: &[&'r KeywordRule]) -> Option<&'r KeywordRule> {
    let mut tiers: Vec<&KeywordRule> = rules.to_vec();
    tiers.sort_by(|a, b| b.score.total_cmp(&a.score));
    tiers
        .into_iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
}

pub fn salutation(text: &Transcript, rules: &[&KeywordRule]) -> f64 {
    matched_tier(text, rules).map_or(0.0, |rule| rule.score)
}

// --- Keyword presence ---

/// (matched, total) keywords of one rule
pub fn keyword_coverage(text: &Transcript, rule: &KeywordRule) -> (usize, usize) {
    let matched = rule.keywords.iter().filter(|k| text.contains(k)).count();
    (matched, rule.keywords.len())
}

/// Fractional credit: each rule contributes `score * matched / total`.
pub fn keyword_presence(text: &Transcript, rules: &[&KeywordRule]) -> f64 {
    rules
        .iter()
        .map(|rule| {
            let (matched, total) = keyword_coverage(text, rule);
            if total == 0 {
                0.0
            } else {
                rule.score * (matched as f64 / total as f64)
            }
        })
        .sum()
}

// --- Flow ---

fn earliest(text: &Transcript, markers: &[&str]) -> Option<usize> {
    markers.iter().filter_map(|m| text.find(m)).min()
}

fn greeting_index(text: &Transcript) -> Option<usize> {
    let phrases = GREETING_PHRASES.iter().filter_map(|m| text.find(m));
    let words = GREETING_WORDS.iter().filter_map(|w| text.find_word(w));
    phrases.chain(words).min()
}

/// Greeting, then every required detail, then closing. All or nothing.
pub fn flow(text: &Transcript) -> f64 {
    let mut last_detail = 0;
    for detail in REQUIRED_DETAILS {
        match text.find(detail) {
            Some(index) => last_detail = last_detail.max(index),
            None => return 0.0,
        }
    }

    let greeting = greeting_index(text);
    let closing = earliest(text, CLOSING_MARKERS);
    let (Some(greeting), Some(closing)) = (greeting, closing) else {
        return 0.0;
    };

    if greeting < last_detail && last_detail < closing {
        FLOW_FULL_SCORE
    } else {
        0.0
    }
}

// --- Speech rate ---

/// `None` when the duration is missing, not finite, or at most one second
pub fn words_per_minute(word_count: usize, duration_seconds: Option<f64>) -> Option<f64> {
    match duration_seconds {
        Some(d) if d.is_finite() && d > 1.0 => Some(word_count as f64 / (d / 60.0)),
        _ => None,
    }
}

/// Unknown rate scores the top band; the caller owns timing validation.
pub fn speech_rate(word_count: usize, duration_seconds: Option<f64>) -> f64 {
    let Some(wpm) = words_per_minute(word_count, duration_seconds) else {
        return SPEECH_RATE_TOP;
    };

    if (111.0..=140.0).contains(&wpm) {
        SPEECH_RATE_TOP
    } else if (81.0..=160.0).contains(&wpm) {
        6.0
    } else {
        2.0
    }
}

// --- Grammar ---

pub fn errors_per_hundred(issue_count: usize, word_count: usize) -> f64 {
    (issue_count as f64 * 100.0) / word_count.max(1) as f64
}

pub fn grammar(issue_count: usize, word_count: usize) -> f64 {
    let rate = errors_per_hundred(issue_count, word_count);
    if rate <= 3.0 {
        GRAMMAR_TOP
    } else if rate <= 6.0 {
        8.0
    } else if rate <= 9.0 {
        6.0
    } else if rate <= 12.0 {
        4.0
    } else {
        GRAMMAR_FLOOR
    }
}

// --- Vocabulary ---

pub fn type_token_ratio(text: &Transcript) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = text.words().iter().map(String::as_str).collect();
    distinct.len() as f64 / text.word_count() as f64
}

pub fn vocabulary(text: &Transcript) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let ttr = type_token_ratio(text);
    if ttr >= 0.7 {
        VOCABULARY_TOP
    } else if ttr >= 0.5 {
        8.0
    } else if ttr >= 0.3 {
        6.0
    } else {
        4.0
    }
}

// --- Filler words ---

pub fn filler_count(text: &Transcript) -> usize {
    text.words()
        .iter()
        .filter(|w| FILLER_WORDS.contains(&w.as_str()))
        .count()
}

/// Filler tokens per hundred words
pub fn filler_rate(text: &Transcript) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    (filler_count(text) as f64 * 100.0) / text.word_count() as f64
}

/// Rates falling between the stated bands (e.g. 3.5%) score 0.
pub fn filler_words(text: &Transcript) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let rate = filler_rate(text);
    if rate <= 3.0 {
        FILLER_TOP
    } else if (4.0..=6.0).contains(&rate) {
        12.0
    } else if (7.0..=9.0).contains(&rate) {
        9.0
    } else if (10.0..=12.0).contains(&rate) {
        6.0
    } else if rate >= 13.0 {
        3.0
    } else {
        0.0
    }
}

// --- Sentiment ---

pub fn sentiment(polarity: f64) -> f64 {
    if polarity >= 0.7 {
        SENTIMENT_TOP
    } else if polarity >= 0.5 {
        12.0
    } else {
        SENTIMENT_FLOOR
    }
}
