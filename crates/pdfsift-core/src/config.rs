use std::time::Duration;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::guard::DEFAULT_MAX_INPUT_BYTES;

pub const DEFAULT_MIN_CHARS: usize = 20;
pub const DEFAULT_MIN_PRINTABLE_RATIO: f64 = 0.70;
pub const DEFAULT_MIN_WORDS: usize = 5;
pub const DEFAULT_MIN_AVG_WORD_LEN: f64 = 2.0;
pub const DEFAULT_MAX_AVG_WORD_LEN: f64 = 30.0;
pub const DEFAULT_MIN_ALPHA_WORD_LEN: usize = 3;
pub const DEFAULT_PAGE_CAP: usize = 50;
pub const DEFAULT_TJ_WORD_GAP: f64 = 200.0;
pub const DEFAULT_STRATEGY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid artifact pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Input size limits checked before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_input_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Thresholds for the text quality validator.
///
/// Use [`ValidatorConfigBuilder`] to construct anything but the defaults.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub(crate) min_chars: usize,
    pub(crate) min_printable_ratio: f64,
    pub(crate) min_words: usize,
    /// Inclusive lower bound on average word length.
    pub(crate) min_avg_word_len: f64,
    /// Exclusive upper bound on average word length.
    pub(crate) max_avg_word_len: f64,
    pub(crate) min_alpha_word_len: usize,
    pub(crate) artifact_patterns: ListOverride<Regex>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            min_printable_ratio: DEFAULT_MIN_PRINTABLE_RATIO,
            min_words: DEFAULT_MIN_WORDS,
            min_avg_word_len: DEFAULT_MIN_AVG_WORD_LEN,
            max_avg_word_len: DEFAULT_MAX_AVG_WORD_LEN,
            min_alpha_word_len: DEFAULT_MIN_ALPHA_WORD_LEN,
            artifact_patterns: ListOverride::Default,
        }
    }
}

impl ValidatorConfig {
    /// Minimum candidate length in characters.
    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn min_words(&self) -> usize {
        self.min_words
    }

    pub fn min_printable_ratio(&self) -> f64 {
        self.min_printable_ratio
    }
}

/// Builder for [`ValidatorConfig`].
///
/// Artifact patterns are compiled case-insensitively in [`build()`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfigBuilder {
    min_chars: Option<usize>,
    min_printable_ratio: Option<f64>,
    min_words: Option<usize>,
    min_avg_word_len: Option<f64>,
    max_avg_word_len: Option<f64>,
    min_alpha_word_len: Option<usize>,
    artifact_patterns: ListOverride<String>,
}

impl ValidatorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_chars(mut self, n: usize) -> Self {
        self.min_chars = Some(n);
        self
    }

    pub fn min_printable_ratio(mut self, ratio: f64) -> Self {
        self.min_printable_ratio = Some(ratio);
        self
    }

    pub fn min_words(mut self, n: usize) -> Self {
        self.min_words = Some(n);
        self
    }

    pub fn avg_word_len_range(mut self, min: f64, max: f64) -> Self {
        self.min_avg_word_len = Some(min);
        self.max_avg_word_len = Some(max);
        self
    }

    pub fn min_alpha_word_len(mut self, n: usize) -> Self {
        self.min_alpha_word_len = Some(n);
        self
    }

    pub fn set_artifact_patterns(mut self, patterns: Vec<String>) -> Self {
        self.artifact_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_artifact_pattern(mut self, pattern: String) -> Self {
        match &mut self.artifact_patterns {
            ListOverride::Extend(v) => v.push(pattern),
            _ => self.artifact_patterns = ListOverride::Extend(vec![pattern]),
        }
        self
    }

    /// Compile patterns and check that thresholds are coherent.
    pub fn build(self) -> Result<ValidatorConfig, ConfigError> {
        let compile = |patterns: Vec<String>| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(ConfigError::from)
                })
                .collect()
        };

        let artifact_patterns = match self.artifact_patterns {
            ListOverride::Default => ListOverride::Default,
            ListOverride::Replace(v) => ListOverride::Replace(compile(v)?),
            ListOverride::Extend(v) => ListOverride::Extend(compile(v)?),
        };

        let config = ValidatorConfig {
            min_chars: self.min_chars.unwrap_or(DEFAULT_MIN_CHARS),
            min_printable_ratio: self
                .min_printable_ratio
                .unwrap_or(DEFAULT_MIN_PRINTABLE_RATIO),
            min_words: self.min_words.unwrap_or(DEFAULT_MIN_WORDS),
            min_avg_word_len: self.min_avg_word_len.unwrap_or(DEFAULT_MIN_AVG_WORD_LEN),
            max_avg_word_len: self.max_avg_word_len.unwrap_or(DEFAULT_MAX_AVG_WORD_LEN),
            min_alpha_word_len: self
                .min_alpha_word_len
                .unwrap_or(DEFAULT_MIN_ALPHA_WORD_LEN),
            artifact_patterns,
        };

        if !(0.0..=1.0).contains(&config.min_printable_ratio) {
            return Err(invalid("min_printable_ratio", "must be between 0 and 1"));
        }
        if config.min_avg_word_len < 0.0 || config.min_avg_word_len >= config.max_avg_word_len {
            return Err(invalid(
                "avg_word_len",
                format!(
                    "range [{}, {}) is empty",
                    config.min_avg_word_len, config.max_avg_word_len
                ),
            ));
        }
        Ok(config)
    }
}

/// Knobs for the extraction strategies themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Maximum number of pages the text-layer strategy walks.
    pub page_cap: usize,
    /// A `TJ` adjustment more negative than `-tj_word_gap` (thousandths of an
    /// em) is rendered as a space.
    pub tj_word_gap: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            page_cap: DEFAULT_PAGE_CAP,
            tj_word_gap: DEFAULT_TJ_WORD_GAP,
        }
    }
}

/// Everything the extraction pipeline needs to run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub limits: Limits,
    pub validator: ValidatorConfig,
    pub extract: ExtractConfig,
    /// Wall-clock budget for a single strategy attempt.
    pub strategy_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            validator: ValidatorConfig::default(),
            extract: ExtractConfig::default(),
            strategy_timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.limits.max_input_bytes == 0 {
            return Err(invalid("max_input_bytes", "must be positive"));
        }
        if self.extract.page_cap == 0 {
            return Err(invalid("page_cap", "must be positive"));
        }
        if self.strategy_timeout.is_zero() {
            return Err(invalid("strategy_timeout_secs", "must be positive"));
        }
        Ok(())
    }
}
