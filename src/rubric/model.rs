use serde::Serialize;
use std::fmt;

/// The eight metrics the engine knows how to score.
///
/// Rubric metric names resolve to a kind once, at load time. An unresolvable
/// name is a configuration error, never a silent zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Salutation,
    KeywordPresence,
    Flow,
    SpeechRate,
    GrammarErrors,
    VocabularyRichness,
    FillerWordRate,
    Sentiment,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::Salutation,
        MetricKind::KeywordPresence,
        MetricKind::Flow,
        MetricKind::SpeechRate,
        MetricKind::GrammarErrors,
        MetricKind::VocabularyRichness,
        MetricKind::FillerWordRate,
        MetricKind::Sentiment,
    ];

    /// Canonical rubric name (lowercase)
    pub fn canonical_name(self) -> &'static str {
        match self {
            MetricKind::Salutation => "salutation level",
            MetricKind::KeywordPresence => "keyword presence",
            MetricKind::Flow => "flow",
            MetricKind::SpeechRate => "speech rate (wpm)",
            MetricKind::GrammarErrors => "grammar errors",
            MetricKind::VocabularyRichness => "vocabulary richness",
            MetricKind::FillerWordRate => "filler word rate",
            MetricKind::Sentiment => "sentiment",
        }
    }

    /// Resolve a rubric metric name. Matching ignores case and surrounding
    /// whitespace, nothing else.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.canonical_name() == key)
    }

    /// Whether the scorer consumes keyword rules as executable data.
    pub fn uses_keywords(self) -> bool {
        matches!(self, MetricKind::Salutation | MetricKind::KeywordPresence)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Keyword vocabulary checked against the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordRule {
    pub scoring_criteria: String,
    /// Lowercased, deduplicated, in declaration order
    pub keywords: Vec<String>,
    pub score: f64,
}

/// Documents a scoring band. The band boundaries live in the scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandDescriptor {
    pub scoring_criteria: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    Keyword(KeywordRule),
    Band(BandDescriptor),
}

impl Rule {
    pub fn scoring_criteria(&self) -> &str {
        match self {
            Rule::Keyword(rule) => &rule.scoring_criteria,
            Rule::Band(band) => &band.scoring_criteria,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Rule::Keyword(rule) => rule.score,
            Rule::Band(band) => band.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub kind: MetricKind,
    pub weight: f64,
    pub max_score: f64,
    pub rules: Vec<Rule>,
}

impl Metric {
    /// Keyword rules in declaration order
    pub fn keyword_rules(&self) -> Vec<&KeywordRule> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                Rule::Keyword(keyword_rule) => Some(keyword_rule),
                Rule::Band(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    pub name: String,
    pub total_weight: f64,
    pub metrics: Vec<Metric>,
}

/// A validated rubric. Only `validate_rubric` constructs one, so holding a
/// `Rubric` means every metric resolved to a scorer and every required
/// number is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    criteria: Vec<Criterion>,
}

impl Rubric {
    pub(crate) fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.criteria
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Iterate every metric in declared order
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.criteria.iter().flat_map(|c| c.metrics.iter())
    }

    pub fn contains_kind(&self, kind: MetricKind) -> bool {
        self.metrics().any(|m| m.kind == kind)
    }

    /// Sum of all criterion weights (100 for the reference rubric)
    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.total_weight).sum()
    }
}
