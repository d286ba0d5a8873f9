use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use pdfsift_core::{DocumentBuffer, ExtractionResponse};

use crate::models::ApiError;
use crate::state::AppState;
use crate::upload;

pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let file = upload::parse_multipart(multipart).await?;
    tracing::info!(filename = %file.filename, bytes = file.data.len(), "received upload");

    let result = state
        .pipeline
        .extract(DocumentBuffer::from(file.data))
        .await
        .inspect_err(|e| tracing::warn!(filename = %file.filename, error = %e, "extraction failed"))?;

    Ok(Json(ExtractionResponse::from(&result)))
}
