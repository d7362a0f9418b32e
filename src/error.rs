use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the whole service. Every failure is converted to a
/// JSON `{error}` body at the handler boundary; nothing crosses a component
/// boundary unhandled.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing credentials or identifiers. Fatal to the call, surfaced verbatim.
    #[error("{0}")]
    Configuration(String),

    /// Missing or rejected bearer token.
    #[error("{0}")]
    Auth(String),

    /// Keyword, field, or row absent.
    #[error("{0}")]
    NotFound(String),

    /// A remote API failed. The detail is logged, never sent to the client.
    #[error("{0}")]
    Upstream(String),

    /// Malformed request body.
    #[error("{0}")]
    Validation(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The message a client is allowed to see. Upstream detail stays in the
    /// logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Upstream(_) => {
                "internal error while talking to an upstream service".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Upstream(detail) = &self {
            error!("upstream failure: {}", detail);
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::http::StatusCode;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("missing".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_detail_is_not_leaked() {
        let err = AppError::Upstream("api key abc123 rejected".into());
        assert!(!err.public_message().contains("abc123"));

        let err = AppError::NotFound("no prompt row matches \"cost\"".into());
        assert!(err.public_message().contains("cost"));
    }
}
