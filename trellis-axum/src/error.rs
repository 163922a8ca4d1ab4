use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::multipart::MultipartError;

/// Error returned by handlers and extractors.
///
/// The response carries a copy of the error in its extensions so the
/// context middleware can hand it to the registered
/// [`ExceptionHandler`](crate::ExceptionHandler).
#[derive(Clone)]
pub enum HttpError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    Internal(String),
    Custom {
        status: StatusCode,
        message: String,
        errors: Vec<Value>,
    },
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::Custom { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HttpError::NotFound(msg)
            | HttpError::BadRequest(msg)
            | HttpError::Unauthorized(msg)
            | HttpError::Forbidden(msg)
            | HttpError::Conflict(msg)
            | HttpError::PayloadTooLarge(msg)
            | HttpError::UnsupportedMediaType(msg)
            | HttpError::Internal(msg) => msg,
            HttpError::Custom { message, .. } => message,
        }
    }

    pub fn errors(&self) -> &[Value] {
        match self {
            HttpError::Custom { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Standard JSON error body: `{ "name", "message", "status", "errors" }`.
pub fn error_response(status: StatusCode, message: &str, errors: &[Value]) -> Response {
    let name = status
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_uppercase()
        .replace(' ', "_");
    let body = serde_json::json!({
        "name": name,
        "message": message,
        "status": status.as_u16(),
        "errors": errors,
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = error_response(self.status(), self.message(), self.errors());
        response.extensions_mut().insert(self);
        response
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status(), self.message())
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::Internal(err.to_string())
    }
}

impl From<MultipartError> for HttpError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::FileTooLarge { .. }
            | MultipartError::TooManyFiles { .. }
            | MultipartError::BodyTooLarge(_) => HttpError::PayloadTooLarge(err.to_string()),
            other => HttpError::BadRequest(other.to_string()),
        }
    }
}

/// `From` impls turning axum extractor rejections into [`HttpError`]s,
/// keeping the rejection's status and text.
///
/// Extract `Result<Path<T>, PathRejection>` and apply `?` to send the
/// rejection through the [`ExceptionHandler`](crate::ExceptionHandler).
macro_rules! map_rejection {
    ( $( $rejection:ty ),* $(,)? ) => {
        $(
            impl From<$rejection> for HttpError {
                fn from(rejection: $rejection) -> Self {
                    HttpError::Custom {
                        status: rejection.status(),
                        message: rejection.body_text(),
                        errors: Vec::new(),
                    }
                }
            }
        )*
    };
}

map_rejection!(
    axum::extract::rejection::PathRejection,
    axum::extract::rejection::QueryRejection,
    axum::extract::rejection::JsonRejection,
    axum::extract::rejection::FormRejection,
    axum::extract::rejection::BytesRejection,
);
