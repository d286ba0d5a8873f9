//! The fallback chain: try each strategy in rank order and return the first
//! candidate the validator accepts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pdfsift_core::{
    DocumentBuffer, ExtractionCandidate, ExtractionResult, PipelineConfig, PipelineError,
    PipelineEvent, StrategyFailure, StrategyId, TextValidator, check_size,
};

use crate::ExtractStrategy;

/// Runs the ranked strategies against one document at a time.
///
/// Cheap to clone and safe to share across tasks; each call to
/// [`Pipeline::extract`] owns all of its state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    validator: Arc<TextValidator>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let validator = TextValidator::new(&config.validator);
        Self {
            config: Arc::new(config),
            validator: Arc::new(validator),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn extract(&self, buffer: DocumentBuffer) -> Result<ExtractionResult, PipelineError> {
        self.extract_with_events(buffer, |_| {}).await
    }

    /// Like [`Pipeline::extract`], reporting each state transition to `on_event`.
    pub async fn extract_with_events(
        &self,
        buffer: DocumentBuffer,
        on_event: impl Fn(PipelineEvent) + Send + Sync,
    ) -> Result<ExtractionResult, PipelineError> {
        let file_size = buffer.len();
        if let Err(e) = check_size(&buffer, &self.config.limits) {
            tracing::warn!(file_size, error = %e, "rejecting input before extraction");
            return Err(e);
        }

        tracing::info!(file_size, "extraction started");
        on_event(PipelineEvent::Started { file_size });

        let mut failures = Vec::new();
        for (rank, strategy) in StrategyId::RANKED.into_iter().enumerate() {
            on_event(PipelineEvent::Trying { rank, strategy });
            tracing::debug!(rank, %strategy, "trying strategy");

            let started = Instant::now();
            let outcome = self.attempt(strategy, &buffer).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(candidate) => {
                    let result = ExtractionResult::from_candidate(candidate, file_size);
                    tracing::info!(
                        %strategy,
                        words = result.word_count,
                        quality = result.quality_tier.as_str(),
                        ?elapsed,
                        "extraction accepted"
                    );
                    on_event(PipelineEvent::Accepted {
                        strategy,
                        word_count: result.word_count,
                        elapsed,
                    });
                    return Ok(result);
                }
                Err(error) => {
                    tracing::warn!(%strategy, %error, ?elapsed, "strategy failed");
                    let failure = StrategyFailure { strategy, error };
                    on_event(PipelineEvent::Failed {
                        rank,
                        failure: failure.clone(),
                        elapsed,
                    });
                    failures.push(failure);
                }
            }
        }

        let err = PipelineError::Exhausted { failures };
        tracing::warn!(error = %err, "no strategy produced acceptable text");
        on_event(PipelineEvent::Exhausted {
            attempts: err.failures().len(),
        });
        Err(err)
    }

    /// Run one strategy under the time budget and judge its output.
    async fn attempt(
        &self,
        strategy: StrategyId,
        buffer: &DocumentBuffer,
    ) -> Result<ExtractionCandidate, String> {
        let job_buffer = buffer.clone();
        let config = Arc::clone(&self.config);
        let candidate = run_with_budget(self.config.strategy_timeout, move || {
            strategy
                .extract(&job_buffer, &config.extract)
                .map_err(|e| e.to_string())
        })
        .await??;

        // Acceptance needs strictly more than the validator's minimum.
        let chars = candidate.text.chars().count();
        let min = self.config.validator.min_chars();
        if chars <= min {
            return Err(format!("text too short ({chars} chars, need more than {min})"));
        }

        let verdict = self.validator.validate(&candidate.text);
        if verdict.accepted {
            return Ok(candidate);
        }
        Err(match verdict.reason {
            Some(reason) => format!("rejected: {reason}"),
            None => "rejected".to_string(),
        })
    }
}

/// Run a blocking job on the blocking pool, giving up after `budget`.
///
/// A job that overruns keeps running in the background; its result is
/// dropped when it finishes.
async fn run_with_budget<T, F>(budget: Duration, job: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) if join_err.is_panic() => Err(format!("strategy panicked: {join_err}")),
        Ok(Err(join_err)) => Err(format!("strategy task failed: {join_err}")),
        Err(_) => Err(format!("timed out after {budget:?}")),
    }
}
