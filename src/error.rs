use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::middleware::RequestId;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid or missing API Key. Add X-Api-Key header with your cron-job.org API Key.")]
    Unauthorized,

    #[error("Target URL not configured. Set [target] url in the configuration file.")]
    TargetNotConfigured,

    #[error("Only {0} allowed")]
    MethodNotAllowed(&'static str),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Ping log error: {0}")]
    Store(#[from] StoreError),

    #[error("Template rendering error: {0}")]
    Template(#[from] tera::Error),
}

impl AppError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::TargetNotConfigured | AppError::InvalidQuery(_) => {
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
            AppError::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        AppErrorResponse {
            error: self,
            request_id: None,
        }
        .into_response()
    }
}

/// An `AppError` tagged with the id of the request that produced it.
#[derive(Debug)]
pub struct AppErrorResponse {
    pub error: AppError,
    pub request_id: Option<RequestId>,
}

impl From<AppError> for AppErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for AppErrorResponse {
    fn into_response(self) -> Response {
        let (status, title) = self.error.status_and_title();
        let request_id = self.request_id.map(|id| id.0.to_string());

        let message = self.error.to_string();
        if status.is_server_error() {
            tracing::error!(request_id = ?request_id, "Internal error: {:?}", self.error);
        } else {
            tracing::debug!(request_id = ?request_id, status = status.as_u16(), "{}", message);
        }

        let body = json!({
            "error": title,
            "message": message,
            "requestId": request_id,
        });

        (status, Json(body)).into_response()
    }
}

/// Attach a request id to errors on their way out of a handler.
pub trait ResultExt<T> {
    fn with_request_id(self, request_id: &RequestId) -> Result<T, AppErrorResponse>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn with_request_id(self, request_id: &RequestId) -> Result<T, AppErrorResponse> {
        self.map_err(|e| AppErrorResponse {
            error: e.into(),
            request_id: Some(request_id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::TargetNotConfigured.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MethodNotAllowed("GET method is").into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Template(tera::Error::msg("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_with_request_id_attaches_id() {
        let id = RequestId(Uuid::new_v4());
        let result: Result<(), AppError> = Err(AppError::Unauthorized);
        let err = result.with_request_id(&id).unwrap_err();
        assert_eq!(err.request_id.map(|r| r.0), Some(id.0));
    }
}
