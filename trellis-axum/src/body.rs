use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HttpError;

/// Request body decoded according to its `Content-Type`.
///
/// | Content type                          | Variant |
/// |---------------------------------------|---------|
/// | `application/json`, `*+json`          | `Json`  |
/// | `application/x-www-form-urlencoded`   | `Form`  |
/// | `text/*`                              | `Text`  |
/// | anything else                         | `Raw`   |
///
/// An empty body is `Empty` whatever the content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
    Raw(Bytes),
}

impl ParsedBody {
    pub fn parse(content_type: Option<&str>, bytes: Bytes) -> Result<Self, HttpError> {
        if bytes.is_empty() {
            return Ok(ParsedBody::Empty);
        }
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if mime == "application/json" || mime.ends_with("+json") {
            serde_json::from_slice(&bytes)
                .map(ParsedBody::Json)
                .map_err(|e| HttpError::BadRequest(format!("Invalid JSON body: {e}")))
        } else if mime == "application/x-www-form-urlencoded" {
            Ok(ParsedBody::Form(
                form_urlencoded::parse(&bytes).into_owned().collect(),
            ))
        } else if mime.starts_with("text/") {
            String::from_utf8(bytes.to_vec())
                .map(ParsedBody::Text)
                .map_err(|e| HttpError::BadRequest(format!("Invalid text body: {e}")))
        } else {
            Ok(ParsedBody::Raw(bytes))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ParsedBody::Empty)
    }

    /// Deserialize a JSON body into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        match self {
            ParsedBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| HttpError::BadRequest(format!("Invalid JSON body: {e}"))),
            _ => Err(HttpError::UnsupportedMediaType(
                "Expected an application/json body".to_string(),
            )),
        }
    }

    /// First value of a form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            ParsedBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            ParsedBody::Json(Value::Object(map)) => map.get(name).and_then(Value::as_str),
            _ => None,
        }
    }
}

/// The request body, unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBody(pub Bytes);

async fn read_body<S: Send + Sync>(req: Request, state: &S) -> Result<Bytes, HttpError> {
    Bytes::from_request(req, state).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HttpError::PayloadTooLarge(rejection.body_text())
        } else {
            HttpError::BadRequest(rejection.body_text())
        }
    })
}

impl<S: Send + Sync> FromRequest<S> for RawBody {
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        read_body(req, state).await.map(RawBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for ParsedBody {
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = read_body(req, state).await?;
        ParsedBody::parse(content_type.as_deref(), bytes)
    }
}
