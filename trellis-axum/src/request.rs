use axum::extract::FromRequestParts;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;

use crate::context::PlatformContext;
use crate::error::HttpError;

/// Read-only view of the incoming request.
#[derive(Debug, Clone)]
pub struct PlatformRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    context: PlatformContext,
}

impl PlatformRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn url(&self) -> &str {
        self.context.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string; `None` when absent or not valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded query string pairs.
    pub fn query(&self) -> Vec<(String, String)> {
        self.uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    pub fn context(&self) -> &PlatformContext {
        &self.context
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PlatformRequest {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = PlatformContext::from_request_parts(parts, state).await?;
        Ok(Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            context,
        })
    }
}

/// Response builder for handlers that set status and headers by hand.
///
/// ```ignore
/// async fn create() -> Result<PlatformResponse, HttpError> {
///     PlatformResponse::new().status(StatusCode::CREATED).json(&user)
/// }
/// ```
#[derive(Debug, Default)]
pub struct PlatformResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
}

impl PlatformResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn set_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::try_from(name)
            .map_err(|e| HttpError::Internal(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| HttpError::Internal(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|e| HttpError::Internal(e.to_string()))?;
        Ok(self.content_type("application/json").bytes(body))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.content_type("text/plain; charset=utf-8")
            .bytes(text.into())
    }

    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// `302 Found` to `location`, unless a status was already set.
    pub fn redirect(mut self, location: &str) -> Result<Self, HttpError> {
        let value = HeaderValue::try_from(location)
            .map_err(|e| HttpError::Internal(format!("invalid redirect location: {e}")))?;
        self.headers.insert(LOCATION, value);
        self.status.get_or_insert(StatusCode::FOUND);
        Ok(self)
    }
}

impl IntoResponse for PlatformResponse {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        (status, self.headers, self.body).into_response()
    }
}
