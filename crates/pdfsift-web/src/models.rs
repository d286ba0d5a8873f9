use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfsift_core::{ErrorResponse, PipelineError};

/// An error response: a status code plus a JSON [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                failures: Vec::new(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match e {
            PipelineError::OversizedInput { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::Exhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            body: ErrorResponse::from(&e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
