use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Duplicate id on create. Reported as 400, not 409.
    #[error("Todo with id {0} already exists")]
    Conflict(i64),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Todo not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TodoError {
    pub fn status(&self) -> StatusCode {
        match self {
            TodoError::InvalidParameter(_)
            | TodoError::InvalidPayload(_)
            | TodoError::Conflict(_) => StatusCode::BAD_REQUEST,
            TodoError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            TodoError::Unauthorized => StatusCode::UNAUTHORIZED,
            TodoError::NotFound => StatusCode::NOT_FOUND,
            TodoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TodoError::InvalidParameter(_) => "INVALID_PARAMETER",
            TodoError::InvalidPayload(_) => "INVALID_PAYLOAD",
            TodoError::Conflict(_) => "CONFLICT",
            TodoError::UnsupportedContentType(_) => "UNSUPPORTED_CONTENT_TYPE",
            TodoError::Unauthorized => "UNAUTHORIZED",
            TodoError::NotFound => "NOT_FOUND",
            TodoError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            TodoError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        if matches!(self, TodoError::Unauthorized) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="todos""#)],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
