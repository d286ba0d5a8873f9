//! Text quality validation.
//!
//! Decides whether a candidate looks like rendered prose or like PDF
//! internals that a strategy decoded by mistake. The checks run in a fixed
//! order and the first one that fails is reported.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::config::ValidatorConfig;

/// Signatures of raw PDF syntax and producer watermarks. Any match means the
/// candidate came from document structure, not page content.
static DEFAULT_ARTIFACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"%PDF-\d",
        r"\b\d+\s+\d+\s+obj\b",
        r"\bendobj\b",
        r"\bendstream\b",
        r"(?m)^\s*stream\s*$",
        r"\bxref\s+\d+\s+\d+",
        r"\btrailer\s*<<",
        r"\bstartxref\b",
        r"/Type\s*/(?:Catalog|Pages?|Font|XObject|ObjStm|XRef)\b",
        r"/Filter\b",
        r"/FlateDecode\b",
        r"/BaseFont\b",
        r"/FontDescriptor\b",
        r"/MediaBox\b",
        r"/Length\s+\d",
        r"/Resources\s*<<",
        r"Skia/PDF",
        r"Google Docs Renderer",
        r"HeadlessChrome",
    ]
    .iter()
    .map(|p| RegexBuilder::new(p).case_insensitive(true).build().unwrap())
    .collect()
});

static DEFAULT_VALIDATOR: Lazy<TextValidator> =
    Lazy::new(|| TextValidator::new(&ValidatorConfig::default()));

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooShort { chars: usize, min: usize },
    Artifact { pattern: String },
    LowPrintableRatio { ratio: f64, min: f64 },
    TooFewWords { words: usize, min: usize },
    AverageWordLength { average: f64, min: f64, max: f64 },
    NoAlphabeticWord { min_len: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort { chars, min } => {
                write!(f, "text too short ({chars} chars, need {min})")
            }
            Rejection::Artifact { pattern } => {
                write!(f, "structural artifact detected (/{pattern}/)")
            }
            Rejection::LowPrintableRatio { ratio, min } => {
                write!(f, "printable ratio {ratio:.2} below {min:.2}")
            }
            Rejection::TooFewWords { words, min } => {
                write!(f, "too few words ({words}, need {min})")
            }
            Rejection::AverageWordLength { average, min, max } => {
                write!(
                    f,
                    "average word length {average:.1} outside [{min}, {max})"
                )
            }
            Rejection::NoAlphabeticWord { min_len } => {
                write!(f, "no alphabetic word of {min_len}+ letters")
            }
        }
    }
}

/// Outcome of [`TextValidator::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct QualityVerdict {
    pub accepted: bool,
    pub reason: Option<Rejection>,
}

impl QualityVerdict {
    fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    fn reject(reason: Rejection) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// A validator with its artifact patterns resolved against the defaults.
#[derive(Debug, Clone)]
pub struct TextValidator {
    config: ValidatorConfig,
    patterns: Vec<Regex>,
}

impl Default for TextValidator {
    fn default() -> Self {
        (*DEFAULT_VALIDATOR).clone()
    }
}

impl TextValidator {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            patterns: config.artifact_patterns.resolve(&DEFAULT_ARTIFACT_PATTERNS),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Judge `text` without modifying it.
    pub fn validate(&self, text: &str) -> QualityVerdict {
        let cfg = &self.config;

        let chars = text.chars().count();
        if chars < cfg.min_chars {
            return QualityVerdict::reject(Rejection::TooShort {
                chars,
                min: cfg.min_chars,
            });
        }

        if let Some(re) = self.patterns.iter().find(|re| re.is_match(text)) {
            return QualityVerdict::reject(Rejection::Artifact {
                pattern: re.as_str().to_string(),
            });
        }

        let ratio = printable_ratio(text);
        if ratio < cfg.min_printable_ratio {
            return QualityVerdict::reject(Rejection::LowPrintableRatio {
                ratio,
                min: cfg.min_printable_ratio,
            });
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < cfg.min_words {
            return QualityVerdict::reject(Rejection::TooFewWords {
                words: words.len(),
                min: cfg.min_words,
            });
        }

        let average = if words.is_empty() {
            0.0
        } else {
            let total: usize = words.iter().map(|w| w.chars().count()).sum();
            total as f64 / words.len() as f64
        };
        if average < cfg.min_avg_word_len || average >= cfg.max_avg_word_len {
            return QualityVerdict::reject(Rejection::AverageWordLength {
                average,
                min: cfg.min_avg_word_len,
                max: cfg.max_avg_word_len,
            });
        }

        if !words
            .iter()
            .any(|w| is_alphabetic_word(w, cfg.min_alpha_word_len))
        {
            return QualityVerdict::reject(Rejection::NoAlphabeticWord {
                min_len: cfg.min_alpha_word_len,
            });
        }

        QualityVerdict::accept()
    }
}

/// Validate with the default thresholds.
pub fn validate(text: &str) -> QualityVerdict {
    DEFAULT_VALIDATOR.validate(text)
}

/// Fraction of bytes that are printable ASCII, newline or tab.
pub fn printable_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let printable = text
        .bytes()
        .filter(|b| matches!(b, 0x20..=0x7e | b'\n' | b'\t'))
        .count();
    printable as f64 / text.len() as f64
}

/// A token that is all letters once edge punctuation is trimmed.
fn is_alphabetic_word(token: &str, min_len: usize) -> bool {
    let core = token.trim_matches(|c: char| !c.is_alphanumeric());
    core.chars().count() >= min_len && core.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfigBuilder;

    const PROSE: &str = "The quarterly report shows steady growth across all regions.";

    fn reason(text: &str) -> Option<Rejection> {
        validate(text).reason
    }

    #[test]
    fn accepts_plain_prose() {
        let verdict = validate(PROSE);
        assert!(verdict.accepted, "{:?}", verdict.reason);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn rejects_short_text() {
        assert_eq!(
            reason("Hello there"),
            Some(Rejection::TooShort { chars: 11, min: 20 })
        );
    }

    #[test]
    fn short_check_wins_over_artifact_check() {
        assert!(matches!(
            reason("endobj"),
            Some(Rejection::TooShort { .. })
        ));
    }

    #[test]
    fn rejects_structural_markers() {
        let samples = [
            "1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj and more words",
            "Some words here then startxref 12345 and some more words",
            "Words before the trailer << /Size 6 /Root 1 0 R >> words after",
            "The producer string was Skia/PDF m120 for this whole document",
            "Filters used: /FlateDecode for every single content stream here",
            "%PDF-1.7 followed by what looks like a perfectly normal sentence",
        ];
        for sample in samples {
            assert!(
                matches!(reason(sample), Some(Rejection::Artifact { .. })),
                "{sample}: {:?}",
                reason(sample)
            );
        }
    }

    #[test]
    fn artifact_match_is_case_insensitive() {
        assert!(matches!(
            reason("this text mentions ENDSTREAM in capital letters only"),
            Some(Rejection::Artifact { .. })
        ));
    }

    #[test]
    fn marker_rejects_even_when_everything_else_passes() {
        let text = format!("{PROSE} {PROSE} endobj");
        assert!(matches!(reason(&text), Some(Rejection::Artifact { .. })));
    }

    #[test]
    fn ordinary_words_do_not_trip_artifact_patterns() {
        assert!(validate("The movie trailer was streamed to every object owner.").accepted);
    }

    #[test]
    fn rejects_low_printable_ratio() {
        let text = "\u{1}\u{2}\u{3}\u{4}\u{5}\u{6}\u{7} abc def ghi jkl\u{1}\u{2}\u{3}\u{4}\u{5}\u{6}\u{7}\u{8}";
        assert!(matches!(
            reason(text),
            Some(Rejection::LowPrintableRatio { .. })
        ));
    }

    #[test]
    fn non_ascii_counts_against_printable_ratio() {
        assert!((printable_ratio("abcd") - 1.0).abs() < f64::EPSILON);
        assert!((printable_ratio("a\nb\t") - 1.0).abs() < f64::EPSILON);
        // "é" is two bytes, neither printable ASCII.
        assert!((printable_ratio("aé") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(printable_ratio(""), 0.0);
    }

    #[test]
    fn rejects_too_few_words() {
        assert_eq!(
            reason("Supercalifragilistic expialidocious"),
            Some(Rejection::TooFewWords { words: 2, min: 5 })
        );
    }

    #[test]
    fn rejects_tiny_average_word_length() {
        assert!(matches!(
            reason("a b c d e f g h i j k l m n"),
            Some(Rejection::AverageWordLength { .. })
        ));
    }

    #[test]
    fn rejects_huge_average_word_length() {
        let long = "x".repeat(40);
        let text = format!("{long} {long} {long} {long} {long}");
        assert!(matches!(
            reason(&text),
            Some(Rejection::AverageWordLength { .. })
        ));
    }

    #[test]
    fn average_word_length_lower_bound_is_inclusive() {
        // Every word is exactly two characters long.
        let config = ValidatorConfigBuilder::new().min_chars(1).build().unwrap();
        let validator = TextValidator::new(&config);
        let verdict = validator.validate("ab cd ef gh ij");
        assert!(matches!(
            verdict.reason,
            Some(Rejection::NoAlphabeticWord { .. })
        ));
    }

    #[test]
    fn rejects_numeric_noise() {
        assert_eq!(
            reason("12 345 6789 1011 1213 1415 1617 ++ --"),
            Some(Rejection::NoAlphabeticWord { min_len: 3 })
        );
    }

    #[test]
    fn alphabetic_word_ignores_edge_punctuation() {
        assert!(is_alphabetic_word("(hello),", 3));
        assert!(!is_alphabetic_word("ab.", 3));
        assert!(!is_alphabetic_word("abc1", 3));
        assert!(is_alphabetic_word("café", 3));
    }

    #[test]
    fn validation_is_deterministic() {
        for text in [PROSE, "endobj endobj endobj endobj endobj", "tiny"] {
            assert_eq!(validate(text), validate(text));
        }
    }

    #[test]
    fn validator_does_not_touch_input() {
        let text = String::from("  lots   of   extra   whitespace   around   here  ");
        let before = text.clone();
        let _ = validate(&text);
        assert_eq!(text, before);
    }

    #[test]
    fn custom_thresholds_apply() {
        let config = ValidatorConfigBuilder::new()
            .min_chars(10)
            .min_words(3)
            .build()
            .unwrap();
        let validator = TextValidator::new(&config);
        assert!(validator.validate("Test PDF Content").accepted);
        assert!(!validate("Test PDF Content").accepted);
    }

    #[test]
    fn replaced_patterns_drop_defaults() {
        let config = ValidatorConfigBuilder::new()
            .set_artifact_patterns(vec!["forbidden".into()])
            .build()
            .unwrap();
        let validator = TextValidator::new(&config);
        assert!(validator.validate("this sentence mentions endobj quite casually").accepted);
        assert!(
            !validator
                .validate("this sentence mentions a Forbidden word somewhere")
                .accepted
        );
    }

    #[test]
    fn rejection_messages_are_readable() {
        assert_eq!(
            Rejection::TooFewWords { words: 2, min: 5 }.to_string(),
            "too few words (2, need 5)"
        );
        assert_eq!(
            Rejection::LowPrintableRatio { ratio: 0.5, min: 0.7 }.to_string(),
            "printable ratio 0.50 below 0.70"
        );
    }
}
