use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub mod config;
pub mod config_file;
pub mod guard;
pub mod response;
pub mod validator;

pub use config::{
    ConfigError, ExtractConfig, ListOverride, Limits, PipelineConfig, ValidatorConfig,
    ValidatorConfigBuilder,
};
pub use guard::{DEFAULT_MAX_INPUT_BYTES, check_size, looks_like_pdf};
pub use response::{ErrorResponse, ExtractionResponse};
pub use validator::{QualityVerdict, Rejection, TextValidator, validate};

/// Raw PDF bytes for a single extraction call.
///
/// Cloning is cheap and never copies the bytes; there is no way to obtain a
/// mutable view of the contents.
#[derive(Clone)]
pub struct DocumentBuffer(Arc<[u8]>);

impl DocumentBuffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for DocumentBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for DocumentBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for DocumentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentBuffer")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Identifies one of the extraction strategies, in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Walks the page tree and each page's text-showing operators.
    TextLayer,
    /// Inflates raw content streams and scans their text objects.
    StreamDecoder,
    /// Pulls parenthesized string literals straight out of the bytes.
    BytePattern,
    /// Always fails; marks the end of the chain.
    Fallback,
}

impl StrategyId {
    /// Every strategy, in the order the pipeline attempts them.
    pub const RANKED: [StrategyId; 4] = [
        StrategyId::TextLayer,
        StrategyId::StreamDecoder,
        StrategyId::BytePattern,
        StrategyId::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::TextLayer => "text_layer",
            StrategyId::StreamDecoder => "stream_decoder",
            StrategyId::BytePattern => "byte_pattern",
            StrategyId::Fallback => "fallback",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text produced by a single strategy invocation, not yet judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionCandidate {
    pub text: String,
    pub page_count: usize,
    pub strategy: StrategyId,
    pub extracted_page_count: usize,
}

/// Coarse usefulness of an accepted extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    /// Word counts above this are rated [`QualityTier::High`].
    pub const HIGH_WORD_THRESHOLD: usize = 100;

    pub fn classify(strategy: StrategyId, word_count: usize) -> Self {
        if strategy == StrategyId::Fallback {
            QualityTier::Low
        } else if word_count > Self::HIGH_WORD_THRESHOLD {
            QualityTier::High
        } else {
            QualityTier::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }
}

/// The accepted outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub page_count: usize,
    pub strategy: StrategyId,
    pub extracted_page_count: usize,
    pub word_count: usize,
    pub character_count: usize,
    pub quality_tier: QualityTier,
    pub file_size: usize,
}

impl ExtractionResult {
    /// Derive the summary fields from an accepted candidate.
    pub fn from_candidate(candidate: ExtractionCandidate, file_size: usize) -> Self {
        let word_count = candidate.text.split_whitespace().count();
        let character_count = candidate.text.chars().count();
        let quality_tier = QualityTier::classify(candidate.strategy, word_count);
        Self {
            text: candidate.text,
            page_count: candidate.page_count,
            strategy: candidate.strategy,
            extracted_page_count: candidate.extracted_page_count,
            word_count,
            character_count,
            quality_tier,
            file_size,
        }
    }
}

/// A strategy that errored or whose output was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: StrategyId,
    pub error: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input is {size} bytes, exceeding the {limit}-byte limit")]
    OversizedInput { size: usize, limit: usize },
    #[error("all extraction strategies failed; last error: {}", last_failure(.failures))]
    Exhausted { failures: Vec<StrategyFailure> },
}

impl PipelineError {
    /// Ordered per-strategy failures, empty for errors raised before any attempt.
    pub fn failures(&self) -> &[StrategyFailure] {
        match self {
            PipelineError::OversizedInput { .. } => &[],
            PipelineError::Exhausted { failures } => failures,
        }
    }
}

/// The last failure, plus the last one from a real strategy when the chain
/// ended on `Fallback`, whose message never varies.
fn last_failure(failures: &[StrategyFailure]) -> String {
    let Some(last) = failures.last() else {
        return "no strategy was attempted".to_string();
    };
    let diagnostic = failures
        .iter()
        .rev()
        .find(|f| f.strategy != StrategyId::Fallback);
    match diagnostic {
        Some(real) if last.strategy == StrategyId::Fallback => format!("{last} (after {real})"),
        _ => last.to_string(),
    }
}

/// Diagnostic events emitted at each pipeline state transition.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Started {
        file_size: usize,
    },
    Trying {
        rank: usize,
        strategy: StrategyId,
    },
    Failed {
        rank: usize,
        failure: StrategyFailure,
        elapsed: Duration,
    },
    Accepted {
        strategy: StrategyId,
        word_count: usize,
        elapsed: Duration,
    },
    Exhausted {
        attempts: usize,
    },
}
