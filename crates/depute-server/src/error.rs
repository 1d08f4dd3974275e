use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use depute_core::RefreshError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<RefreshError>() {
            // The deployment itself is misconfigured.
            Some(RefreshError::InvalidScheduleTime(_) | RefreshError::InvalidConfig { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
