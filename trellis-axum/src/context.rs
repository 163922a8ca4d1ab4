//! Per-request context and the middleware driving its lifecycle.
//!
//! Every request gets a [`PlatformContext`]:
//!
//! 1. The id is read from `X-Request-Id`, or generated as a UUID v4.
//! 2. The context is stored as a request extension and started.
//! 3. The request runs. A matched operation marks the context as done.
//! 4. Failures go to the [`ExceptionHandler`]: returned [`HttpError`]s,
//!    panics, and 404 responses no operation produced. Bare axum extractor
//!    rejections are plain responses and pass through; extract
//!    `Result<E, E::Rejection>` and use `?` to route them as [`HttpError`]s.
//! 5. The id is copied into the response `X-Request-Id` header and the
//!    context is finished, whatever happened before.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;
use tracing::{debug, info};

use crate::error::HttpError;
use crate::exceptions::{Exception, ExceptionHandler};

pub(crate) static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

struct ContextInner {
    id: String,
    method: Method,
    url: String,
    started_at: Instant,
    done: AtomicBool,
    finished: AtomicBool,
}

/// State of one request, shared between the middleware and handlers.
///
/// Cheap to clone. Extract it in a handler with a `ctx: PlatformContext`
/// argument.
#[derive(Clone)]
pub struct PlatformContext {
    inner: Arc<ContextInner>,
}

impl PlatformContext {
    pub fn new(id: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: id.into(),
                method,
                url: url.into(),
                started_at: Instant::now(),
                done: AtomicBool::new(false),
                finished: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Request path and query string.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Whether an operation handled the request.
    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    pub fn done(&self) {
        self.inner.done.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub(crate) fn start(&self) {
        debug!(request_id = %self.id(), method = %self.method(), url = %self.url(), "Request started");
    }

    /// Log the end of the request. Only the first call has an effect.
    pub(crate) fn finish(&self, status: StatusCode) {
        if self.inner.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            request_id = %self.id(),
            method = %self.method(),
            url = %self.url(),
            status = status.as_u16(),
            duration_ms = self.elapsed().as_millis() as u64,
            "Request finished"
        );
    }

    fn from_parts(parts: &Parts) -> Self {
        let id = parts
            .headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Self::new(id, parts.method.clone(), url)
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("id", &self.inner.id)
            .field("method", &self.inner.method)
            .field("url", &self.inner.url)
            .field("done", &self.is_done())
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PlatformContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<PlatformContext>() {
            return Ok(ctx.clone());
        }
        let ctx = PlatformContext::from_parts(parts);
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

/// Route layer installed on every operation: reaching it means the request
/// matched a declared route.
pub(crate) async fn mark_handled(req: Request, next: Next) -> Response {
    if let Some(ctx) = req.extensions().get::<PlatformContext>() {
        ctx.done();
    }
    next.run(req).await
}

pub(crate) async fn context_middleware(
    State(exceptions): State<Arc<dyn ExceptionHandler>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let ctx = PlatformContext::from_parts(&parts);
    parts.extensions.insert(ctx.clone());
    ctx.start();

    let outcome = AssertUnwindSafe(next.run(Request::from_parts(parts, body)))
        .catch_unwind()
        .await;

    let mut response = match outcome {
        Ok(mut response) => {
            if let Some(err) = response.extensions_mut().remove::<HttpError>() {
                exceptions.catch(Exception::Http(err), &ctx)
            } else if response.status() == StatusCode::NOT_FOUND && !ctx.is_done() {
                exceptions.resource_not_found(&ctx)
            } else {
                response
            }
        }
        Err(payload) => exceptions.catch(Exception::Panic(panic_message(payload)), &ctx),
    };

    if let Ok(value) = HeaderValue::from_str(ctx.id()) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    ctx.finish(response.status());
    response
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
