use pdfsift_core::{DocumentBuffer, ExtractConfig, ExtractionCandidate, StrategyId};
use thiserror::Error;

pub mod normalize;
pub mod pipeline;
pub mod strategy;
mod text_ops;

pub use normalize::{expand_ligatures, normalize_text};
pub use pipeline::Pipeline;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("document has no pages")]
    NoPages,
    #[error("all {0} pages failed to yield content")]
    AllPagesFailed(usize),
    #[error("no decodable content streams found")]
    NoStreams,
    #[error("no text found")]
    NoText,
    #[error("no extraction strategy produced usable text")]
    Exhausted,
}

/// One way of getting text out of a PDF.
///
/// Implementations never see a mutable view of the buffer and never judge
/// their own output; that is left to the validator.
pub trait ExtractStrategy {
    fn extract(
        &self,
        buffer: &DocumentBuffer,
        config: &ExtractConfig,
    ) -> Result<ExtractionCandidate, StrategyError>;
}

impl ExtractStrategy for StrategyId {
    fn extract(
        &self,
        buffer: &DocumentBuffer,
        config: &ExtractConfig,
    ) -> Result<ExtractionCandidate, StrategyError> {
        match self {
            StrategyId::TextLayer => strategy::text_layer::extract(buffer, config),
            StrategyId::StreamDecoder => strategy::stream_decoder::extract(buffer, config),
            StrategyId::BytePattern => strategy::byte_pattern::extract(buffer),
            StrategyId::Fallback => strategy::fallback::extract(buffer),
        }
    }
}
