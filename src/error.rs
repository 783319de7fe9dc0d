use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No preference signal: {0}")]
    NoSignal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Completion parse error: {0}")]
    ParseFailure(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-checkable reason code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoSignal(_) => "NoSignal",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Upstream(_) | AppError::HttpClient(_) => "UpstreamUnavailable",
            AppError::ParseFailure(_) => "ParseFailure",
            AppError::Cache(_) | AppError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NoSignal(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::HttpClient(_) | AppError::ParseFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signal_code() {
        let err = AppError::NoSignal("no liked games".to_string());
        assert_eq!(err.code(), "NoSignal");
    }

    #[test]
    fn test_upstream_code() {
        let err = AppError::Upstream("catalog returned 500".to_string());
        assert_eq!(err.code(), "UpstreamUnavailable");
    }

    #[test]
    fn test_parse_failure_code() {
        let err = AppError::ParseFailure("not a JSON array".to_string());
        assert_eq!(err.code(), "ParseFailure");
    }

    #[test]
    fn test_not_found_code() {
        let err = AppError::NotFound("game 42 does not exist".to_string());
        assert_eq!(err.code(), "NotFound");
    }
}
