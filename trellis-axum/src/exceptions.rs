use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use tracing::error;

use crate::context::PlatformContext;
use crate::error::{error_response, HttpError};

/// Failure reaching the exception handler.
#[derive(Debug, Clone)]
pub enum Exception {
    /// Error returned by a handler or an extractor.
    Http(HttpError),
    /// A handler panicked; holds the panic payload when it was a string.
    Panic(String),
}

impl Exception {
    pub fn status(&self) -> StatusCode {
        match self {
            Exception::Http(err) => err.status(),
            Exception::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to the client.
    pub fn message(&self) -> &str {
        match self {
            Exception::Http(err) => err.message(),
            Exception::Panic(_) => "Internal server error",
        }
    }

    pub fn errors(&self) -> &[Value] {
        match self {
            Exception::Http(err) => err.errors(),
            Exception::Panic(_) => &[],
        }
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exception::Http(err) => write!(f, "{err}"),
            Exception::Panic(msg) => write!(f, "handler panicked: {msg}"),
        }
    }
}

impl From<HttpError> for Exception {
    fn from(err: HttpError) -> Self {
        Exception::Http(err)
    }
}

/// Turns failures into responses.
///
/// Register an `Arc<dyn ExceptionHandler>` in the platform injector to
/// replace [`PlatformExceptions`].
pub trait ExceptionHandler: Send + Sync + 'static {
    fn catch(&self, exception: Exception, ctx: &PlatformContext) -> Response;

    /// Called when no operation handled the request.
    fn resource_not_found(&self, ctx: &PlatformContext) -> Response {
        let message = format!("Resource \"{}\" not found", ctx.url());
        self.catch(Exception::Http(HttpError::NotFound(message)), ctx)
    }
}

/// Default exception handler: logs the failure and renders the standard
/// JSON error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformExceptions;

impl ExceptionHandler for PlatformExceptions {
    fn catch(&self, exception: Exception, ctx: &PlatformContext) -> Response {
        let status = exception.status();
        if status.is_server_error() {
            error!(request_id = %ctx.id(), url = %ctx.url(), error = %exception, "Request failed");
        }
        error_response(status, exception.message(), exception.errors())
    }
}
