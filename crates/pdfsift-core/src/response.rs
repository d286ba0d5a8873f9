//! JSON shapes handed back to callers of the extraction service.

use serde::Serialize;

use crate::{ExtractionResult, PipelineError, StrategyFailure};

// ── Success body ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResponse {
    pub text: String,
    pub info: InfoJson,
    pub metadata: MetadataJson,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoJson {
    pub pages: usize,
    pub characters: usize,
    pub words: usize,
    pub method: &'static str,
    #[serde(rename = "extractedPages")]
    pub extracted_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataJson {
    pub extraction_method: &'static str,
    pub file_size: usize,
    pub extraction_quality: &'static str,
}

impl From<&ExtractionResult> for ExtractionResponse {
    fn from(r: &ExtractionResult) -> Self {
        Self {
            text: r.text.clone(),
            info: InfoJson {
                pages: r.page_count,
                characters: r.character_count,
                words: r.word_count,
                method: r.strategy.as_str(),
                extracted_pages: r.extracted_page_count,
            },
            metadata: MetadataJson {
                extraction_method: r.strategy.as_str(),
                file_size: r.file_size,
                extraction_quality: r.quality_tier.as_str(),
            },
        }
    }
}

// ── Error body ──────────────────────────────────────────────────────────

/// Total failure: a readable message and the per-strategy reasons, never
/// any partial text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub failures: Vec<StrategyFailure>,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(e: &PipelineError) -> Self {
        Self {
            error: e.to_string(),
            failures: e.failures().to_vec(),
        }
    }
}
