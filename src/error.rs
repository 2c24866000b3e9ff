/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / token error / validation error を統一的に変換
 *
 * Body shape
 * - validation / credential / internal errors: JSON array of strings
 * - everything else: JSON string
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::SigningError;

/// Message returned for every 500. Details stay in the server log.
pub const INTERNAL_SERVER_ERROR: &str = "something went wrong";
pub const INVALID_CREDENTIALS: &str = "invalid email or password";
pub const LOGIN_REQUIRED: &str = "login required";
pub const FORBIDDEN: &str = "forbidden";
pub const PAYLOAD_TOO_LARGE: &str = "request body too large";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("request timed out")]
    Timeout,
    #[error("internal server error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(e: impl Into<anyhow::Error>) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Value) = match self {
            AppError::Validation(messages) => (StatusCode::BAD_REQUEST, json!(messages)),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!(message)),
            AppError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, json!([INVALID_CREDENTIALS]))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!(LOGIN_REQUIRED)),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, json!(message)),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!(message)),
            AppError::Conflict(message) => (StatusCode::CONFLICT, json!(message)),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!([PAYLOAD_TOO_LARGE]))
            }
            AppError::Timeout => (StatusCode::REQUEST_TIMEOUT, json!([INTERNAL_SERVER_ERROR])),
            AppError::Internal(err) => {
                // Emitted inside the request span, so the log line carries the trace id.
                tracing::error!(
                    error = %format!("{err:#}"),
                    backtrace = %err.backtrace(),
                    "internal error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!([INTERNAL_SERVER_ERROR]),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict { email } => {
                AppError::Conflict(format!("user <{email}> already exists"))
            }
            // NotFound has a different meaning per endpoint; handlers match it
            // before it gets here. Anything left over is a server bug.
            RepoError::NotFound | RepoError::Db(_) => AppError::Internal(e.into()),
        }
    }
}

impl From<SigningError> for AppError {
    fn from(e: SigningError) -> Self {
        AppError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_detail_never_reaches_the_body() {
        let err = AppError::internal(anyhow::anyhow!("connection refused: 10.0.0.7:5432"));
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!(["something went wrong"]));
    }

    #[tokio::test]
    async fn validation_errors_are_an_array() {
        let err = AppError::Validation(vec!["email is required".into()]);
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!(["email is required"]));
    }

    #[tokio::test]
    async fn repo_conflict_maps_to_409() {
        let err: AppError = RepoError::Conflict {
            email: "a@b.com".into(),
        }
        .into();
        let (status, _) = render(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn payload_too_large_is_an_array() {
        let (status, body) = render(AppError::PayloadTooLarge).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!(["request body too large"]));
    }

    #[tokio::test]
    async fn unauthorized_asks_for_login() {
        let (status, body) = render(AppError::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!("login required"));
    }
}
