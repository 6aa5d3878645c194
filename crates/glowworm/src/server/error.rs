//! HTTP error envelope: `{ "error": ..., "details": ... }`.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use glowworm_core::{ConfigError, PipelineError};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),
    /// 404
    NotFound(String),
    /// 413
    PayloadTooLarge(String),
    /// A provider rejected the request; its status is passed through
    Upstream { status: StatusCode, message: String },
    /// 500
    Internal { error: String, details: Option<String> },
}

impl ApiError {
    pub fn internal(error: impl Into<String>, details: impl ToString) -> Self {
        Self::Internal {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => Self::BadRequest(msg),
            PipelineError::NotFound(msg) => Self::NotFound(msg),
            PipelineError::NotConfigured(e) => e.into(),
            PipelineError::Provider {
                message,
                status_code: Some(code),
            } => match StatusCode::from_u16(code) {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    Self::Upstream { status, message }
                }
                _ => Self::internal("Provider request failed", message),
            },
            other => Self::internal("Request failed", other),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self::internal("Service not configured", err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("Upload exceeds the size limit".to_string())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(error) | Self::NotFound(error) | Self::PayloadTooLarge(error) => {
                json!({ "error": error })
            }
            Self::Upstream { message, .. } => {
                json!({ "error": "Provider rejected the request", "details": message })
            }
            Self::Internal { error, details } => match details {
                Some(details) => json!({ "error": error, "details": details }),
                None => json!({ "error": error }),
            },
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{body}");
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_errors_map_to_statuses() {
        let cases = [
            (PipelineError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                PipelineError::Provider {
                    message: "quota".into(),
                    status_code: Some(429),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                PipelineError::Provider {
                    message: "odd".into(),
                    status_code: Some(302),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PipelineError::Timeout {
                    stage: "video".into(),
                    timeout_ms: 10,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ConfigError::not_configured("video", "set LUMA_API_KEY").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
