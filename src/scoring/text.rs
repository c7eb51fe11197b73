/// Read-only view of a transcript with the derived forms scorers need.
///
/// Built once per scoring call so every metric sees the same word count.
#[derive(Debug, Clone)]
pub struct Transcript<'a> {
    raw: &'a str,
    lower: String,
    words: Vec<String>,
}

impl<'a> Transcript<'a> {
    pub fn new(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        let words = lower.split_whitespace().map(str::to_string).collect();
        Self {
            raw: trimmed,
            lower,
            words,
        }
    }

    /// Trimmed original text, as handed to providers
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Lowercased whitespace-separated tokens, punctuation untouched
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Byte offset of the first occurrence of `needle` in the lowercased text
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.lower.find(needle)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    /// Byte offset of the first token equal to `word` once its leading and
    /// trailing punctuation is trimmed. "hi," matches "hi"; "this" does not.
    pub fn find_word(&self, word: &str) -> Option<usize> {
        let base = self.lower.as_ptr() as usize;
        self.lower
            .split_whitespace()
            .find(|token| token.trim_matches(|c: char| !c.is_alphanumeric()) == word)
            .map(|token| token.as_ptr() as usize - base)
    }
}
