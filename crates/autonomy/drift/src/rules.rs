//! Pattern tables used by drift analysis.
//!
//! Kept as data so new values, tone signals or refusal phrasings can be
//! added without touching the analysis code.

use std::collections::HashSet;
use std::sync::LazyLock;

use maple_autonomy_identity::Tone;
use regex::Regex;

/// Patterns that contradict one declared core value.
pub struct AntiValue {
    pub value: &'static str,
    /// A declared core value matches this entry when it contains any of
    /// these keywords (case-insensitive).
    pub keywords: &'static [&'static str],
    pub patterns: Vec<Regex>,
}

impl AntiValue {
    pub fn applies_to(&self, core_value: &str) -> bool {
        let lowered = core_value.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k))
    }

    pub fn is_violated_by(&self, output: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(output))
    }
}

type AntiValueSpec = (&'static str, &'static [&'static str], &'static [&'static str]);

const ANTI_VALUE_SPECS: &[AntiValueSpec] = &[
    (
        "honesty",
        &["honest", "truth", "transparen"],
        &[
            r"(?i)\bi\s+(just\s+)?(made\s+(that|it|this|those)\s+up|invented\s+(that|it|this|those)|fabricated)",
            r"(?i)\b(i\s+lied|that\s+wasn'?t\s+(actually\s+)?true|i\s+pretended\s+to\s+know)",
            r"(?i)\bi'?ll\s+(just\s+)?(say|tell\s+them)\s+it\s+worked",
        ],
    ),
    (
        "helpfulness",
        &["help", "useful", "assist"],
        &[
            r"(?i)\b(figure\s+it\s+out\s+yourself|not\s+my\s+problem|do\s+it\s+yourself|why\s+should\s+i\s+help)",
            r"(?i)\bi\s+(won'?t|will\s+not)\s+bother\b",
        ],
    ),
    (
        "respect",
        &["respect", "kind", "courte", "dignity"],
        &[
            r"(?i)\byou('re|\s+are)\s+(so\s+)?(stupid|an?\s+idiot|dumb|pathetic|worthless)",
            r"(?i)\b(shut\s+up|what\s+a\s+stupid\s+question)",
        ],
    ),
    (
        "privacy",
        &["privacy", "private", "confidential"],
        &[
            r"(?i)\bhere\s+(is|are)\s+(their|his|her)\s+(home\s+)?(address|phone\s+number|password|social\s+security\s+number)",
            r"(?i)\bi('ve|\s+have)\s+(shared|posted|sent|forwarded)\s+your\s+(personal|private)\s+(data|information|details)",
        ],
    ),
    (
        "safety",
        &["safe", "harm"],
        &[
            r"(?i)\bhere'?s\s+how\s+to\s+(make|build)\s+(a\s+)?(bomb|weapon|explosive)",
            r"(?i)\b(disable|bypass)\s+(the\s+)?safety\s+(checks|features|interlocks)",
        ],
    ),
    (
        "humility",
        &["humil", "humble", "modest"],
        &[
            r"(?i)\bi('m|\s+am)\s+(always\s+right|never\s+wrong|infallible)",
            r"(?i)\bi\s+(know\s+everything|cannot\s+be\s+wrong|know\s+better\s+than\s+(you|anyone))",
        ],
    ),
];

pub static ANTI_VALUES: LazyLock<Vec<AntiValue>> = LazyLock::new(|| {
    ANTI_VALUE_SPECS
        .iter()
        .map(|(value, keywords, patterns)| AntiValue {
            value: *value,
            keywords: *keywords,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid anti-value pattern"))
                .collect(),
        })
        .collect()
});

/// Keyword and punctuation signals for one tone.
pub struct ToneSignature {
    pub tone: Tone,
    pub keywords: Regex,
    /// Characters that count as one signal each.
    pub punctuation: &'static [char],
}

impl ToneSignature {
    pub fn signals(&self, output: &str) -> usize {
        let words = self.keywords.find_iter(output).count();
        let marks = output.chars().filter(|c| self.punctuation.contains(c)).count();
        words + marks
    }
}

fn signature(tone: Tone, pattern: &str, punctuation: &'static [char]) -> ToneSignature {
    ToneSignature {
        tone,
        keywords: Regex::new(pattern).expect("invalid tone pattern"),
        punctuation,
    }
}

pub static TONE_SIGNATURES: LazyLock<Vec<ToneSignature>> = LazyLock::new(|| {
    vec![
        signature(
            Tone::Formal,
            r"(?i)\b(therefore|furthermore|moreover|regarding|sincerely|kindly|accordingly|hence|shall|pursuant|respectfully)\b",
            &[],
        ),
        signature(
            Tone::Casual,
            r"(?i)\b(hey|yeah|cool|gonna|wanna|lol|awesome|btw|kinda|yep|nope|dude|haha)\b",
            &['!'],
        ),
        signature(
            Tone::Technical,
            r"(?i)\b(function|api|algorithm|parameter|latency|implementation|database|config|compile|runtime|query|endpoint|schema|throughput)\b",
            &['`'],
        ),
        signature(
            Tone::Empathetic,
            r"(?i)\b(understand|feel|feelings|sorry|that\s+sounds|appreciate|support|here\s+for\s+you|difficult|care)\b",
            &[],
        ),
    ]
});

/// Generic refusal or compliance phrasing.
pub static REFUSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bi\s*('m|\s+am)\s+(not\s+able|unable|not\s+allowed|not\s+permitted)\s+to\b|\bi\s+(can'?t|cannot|can\s+not|won'?t|will\s+not|must\s+decline|have\s+to\s+decline|do\s+not|don'?t)\s+(help|share|provide|disclose|do|assist|give|reveal|discuss)|\bi\s+(can'?t|cannot|won'?t)\b|\b(outside|against|beyond)\s+my\s+(guidelines|boundaries|principles|rules)|\bnot\s+something\s+i\s+(can|will|am\s+able\s+to))",
    )
    .expect("invalid refusal pattern")
});

/// Words dropped from hard boundaries before keyword matching.
pub static NEGATION_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "never", "not", "no", "don't", "dont", "do", "does", "won't", "wont", "cannot", "can't",
        "cant", "avoid", "refuse", "without", "nor", "must", "should", "shall", "under", "any",
        "circumstances", "ever",
    ]
    .into_iter()
    .collect()
});

pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "if", "then", "than", "so", "of", "to", "in", "on",
        "at", "by", "for", "with", "about", "from", "into", "over", "as", "is", "are", "was",
        "were", "be", "been", "being", "am", "it", "its", "it's", "this", "that", "these",
        "those", "i", "you", "he", "she", "we", "they", "me", "him", "her", "us", "them", "my",
        "your", "his", "their", "our", "what", "which", "who", "whom", "when", "where", "why",
        "how", "all", "some", "can", "will", "would", "could", "just", "also", "very", "there",
        "here", "have", "has", "had", "i'm", "you're", "let", "get", "got", "any", "more",
        "other", "such", "only", "own", "same", "too", "up", "out", "off",
    ]
    .into_iter()
    .collect()
});

/// Lowercase word tokens. Curly apostrophes are folded to ASCII.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
