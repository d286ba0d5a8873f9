//! Rank 4: the end of the chain. Reached only when every other strategy
//! failed or was rejected; it reports that and nothing more.

use pdfsift_core::{DocumentBuffer, ExtractionCandidate};

use crate::StrategyError;

pub fn extract(_buffer: &DocumentBuffer) -> Result<ExtractionCandidate, StrategyError> {
    Err(StrategyError::Exhausted)
}
