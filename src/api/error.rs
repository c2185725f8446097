use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::clients::github::UpstreamError;
use crate::services::cache::CacheError;

use super::ErrorBody;

const FETCH_FAILED: &str = "Failed to fetch data";
const INVALID_REQUEST: &str = "Invalid request";

#[derive(Debug)]
pub enum ApiError {
    UpstreamError(String),

    CacheError(String),

    ValidationError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::UpstreamError(msg) => {
                tracing::error!("GitHub error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED, msg)
            }
            ApiError::CacheError(msg) => {
                tracing::error!("Cache error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED, msg)
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, INVALID_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED, msg)
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::UpstreamError(err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InternalError(format!("Failed to serialize response: {err}"))
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upstream_error_is_500_with_message() {
        let err: ApiError = UpstreamError::Status {
            status: 403,
            message: "API rate limit exceeded".to_string(),
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to fetch data");
        assert_eq!(
            body["message"],
            "GitHub API returned 403: API rate limit exceeded"
        );
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let response = ApiError::validation("bad language").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request");
        assert_eq!(body["message"], "bad language");
    }
}
