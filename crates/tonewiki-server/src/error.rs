use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use tonewiki_backend::WikiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Wiki(#[from] WikiError),

    #[error("store error: {0}")]
    Store(#[from] tonewiki_store::StoreError),

    #[error("sign-in required")]
    Unauthenticated,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Wiki(e) => match e {
                WikiError::NotFound(_) => StatusCode::NOT_FOUND,
                WikiError::AlreadyExists(_) => StatusCode::CONFLICT,
                WikiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                WikiError::AuthFailed => StatusCode::UNAUTHORIZED,
                e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            if status == StatusCode::SERVICE_UNAVAILABLE {
                tracing::warn!(error = %self, "backend unavailable");
                "storage temporarily unavailable".to_string()
            } else {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tonewiki_store::StoreError;

    #[test]
    fn status_mapping() {
        let cases = [
            (WikiError::NotFound("page x".into()), StatusCode::NOT_FOUND),
            (WikiError::AlreadyExists("user x".into()), StatusCode::CONFLICT),
            (WikiError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (WikiError::AuthFailed, StatusCode::UNAUTHORIZED),
            (
                WikiError::Store(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WikiError::CorruptRecord {
                    key: "sandy".into(),
                    reason: "no hash".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
        assert_eq!(ServerError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let response = ServerError::Internal("secret path /var/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }
}
