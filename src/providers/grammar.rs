use futures::future::BoxFuture;

use super::{GrammarProvider, ProviderError};

const SENTENCE_END: &[char] = &['.', '!', '?'];
const DETACHED_PUNCTUATION: &[char] = &[',', '.', '!', '?', ';', ':'];

/// Offline rule-based grammar checker.
///
/// Flags a small set of surface errors that need no language model:
/// - the same word twice in a row ("is is")
/// - lowercase pronoun "i" (also "i'm", "i've", ...)
/// - a sentence starting with a lowercase letter
/// - `a` before a vowel sound or `an` before a consonant
/// - whitespace before punctuation ("hello , world")
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicGrammar;

impl HeuristicGrammar {
    pub fn new() -> Self {
        Self
    }

    pub fn count(&self, text: &str) -> usize {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut issues = 0;
        let mut sentence_start = true;

        for (i, raw) in tokens.iter().enumerate() {
            if raw.chars().all(|c| DETACHED_PUNCTUATION.contains(&c)) {
                issues += 1;
                sentence_start = raw.ends_with(SENTENCE_END);
                continue;
            }

            let word = normalize(raw);
            let prev = i
                .checked_sub(1)
                .map(|p| tokens[p])
                .filter(|p| !p.ends_with(|c: char| c.is_ascii_punctuation()));

            if is_lowercase_pronoun(raw) {
                issues += 1;
            } else if sentence_start && raw.chars().next().is_some_and(|c| c.is_lowercase()) {
                issues += 1;
            }

            if let Some(prev) = prev {
                let prev_word = normalize(prev);
                if !word.is_empty()
                    && prev_word == word
                    && word.chars().all(|c| c.is_alphabetic())
                {
                    issues += 1;
                }
                if article_mismatch(&prev_word, &word) {
                    issues += 1;
                }
            }

            sentence_start = raw.ends_with(SENTENCE_END);
        }

        issues
    }
}

fn normalize(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

fn is_lowercase_pronoun(raw: &str) -> bool {
    let trimmed = raw.trim_end_matches(|c: char| c.is_ascii_punctuation());
    trimmed == "i" || trimmed.starts_with("i'")
}

fn article_mismatch(article: &str, word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return false;
    };
    match article {
        // "a university", "a one-off" are fine
        "a" => {
            matches!(first, 'a' | 'e' | 'i' | 'o')
                && !word.starts_with("one")
                && !word.starts_with("once")
        }
        // "an hour", "an umbrella" are fine
        "an" => first.is_ascii_alphabetic() && !matches!(first, 'a' | 'e' | 'i' | 'o' | 'u' | 'h'),
        _ => false,
    }
}

impl GrammarProvider for HeuristicGrammar {
    fn name(&self) -> &'static str {
        "heuristic-grammar"
    }

    fn issue_count<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, ProviderError>> {
        Box::pin(futures::future::ready(Ok(self.count(text))))
    }
}
