use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use bytes::Bytes;

use crate::error::HttpError;
use crate::settings::MultipartSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    MissingField(String),
    TooManyFiles { max: usize },
    FileTooLarge { field: String, max: usize },
    /// The body went over the server body limit.
    BodyTooLarge(String),
    /// The body is not valid `multipart/form-data`.
    Malformed(String),
}

impl std::fmt::Display for MultipartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(name) => write!(f, "missing required field: {name}"),
            Self::TooManyFiles { max } => write!(f, "too many files, at most {max} accepted"),
            Self::FileTooLarge { field, max } => {
                write!(f, "file in field '{field}' exceeds {max} bytes")
            }
            Self::BodyTooLarge(msg) => write!(f, "multipart body too large: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed multipart body: {msg}"),
        }
    }
}

impl std::error::Error for MultipartError {}

impl From<axum::extract::multipart::MultipartError> for MultipartError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BodyTooLarge(err.body_text())
        } else {
            Self::Malformed(err.body_text())
        }
    }
}

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field name.
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Text and file fields of a multipart form, keyed by field name.
#[derive(Debug, Default)]
pub struct MultipartFields {
    pub text: HashMap<String, Vec<String>>,
    pub files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartFields {
    /// Drain `multipart`, enforcing the file count and size limits.
    ///
    /// A field carrying a file name is a file, anything else is text.
    pub async fn collect_from(
        mut multipart: Multipart,
        limits: &MultipartSettings,
    ) -> Result<Self, MultipartError> {
        let mut fields = MultipartFields::default();
        let mut file_count = 0;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_some() {
                file_count += 1;
                if file_count > limits.max_files {
                    return Err(MultipartError::TooManyFiles {
                        max: limits.max_files,
                    });
                }
            }

            let data = field.bytes().await?;

            if file_name.is_some() {
                if data.len() > limits.max_file_size {
                    return Err(MultipartError::FileTooLarge {
                        field: name,
                        max: limits.max_file_size,
                    });
                }
                fields.files.entry(name.clone()).or_default().push(UploadedFile {
                    name,
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = String::from_utf8(data.to_vec())
                    .map_err(|e| MultipartError::Malformed(e.to_string()))?;
                fields.text.entry(name).or_default().push(value);
            }
        }

        Ok(fields)
    }

    pub fn take_text(&mut self, name: &str) -> Result<String, MultipartError> {
        self.take_text_opt(name)
            .ok_or_else(|| MultipartError::MissingField(name.to_string()))
    }

    pub fn take_text_opt(&mut self, name: &str) -> Option<String> {
        take_first(&mut self.text, name)
    }

    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, MultipartError> {
        self.take_file_opt(name)
            .ok_or_else(|| MultipartError::MissingField(name.to_string()))
    }

    pub fn take_file_opt(&mut self, name: &str) -> Option<UploadedFile> {
        take_first(&mut self.files, name)
    }

    /// Every file sent under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

fn take_first<T>(map: &mut HashMap<String, Vec<T>>, name: &str) -> Option<T> {
    map.get_mut(name)
        .and_then(|v| if v.is_empty() { None } else { Some(v.remove(0)) })
}

/// Extractor collecting a `multipart/form-data` body.
///
/// Limits come from the server's [`MultipartSettings`]; the defaults apply
/// when the handler runs outside a platform-built router.
///
/// ```ignore
/// async fn upload(MultipartForm(mut form): MultipartForm) -> Result<String, HttpError> {
///     let avatar = form.take_file("avatar")?;
///     Ok(format!("{} bytes", avatar.len()))
/// }
/// ```
pub struct MultipartForm(pub MultipartFields);

impl<S: Send + Sync> FromRequest<S> for MultipartForm {
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let limits = req
            .extensions()
            .get::<MultipartSettings>()
            .copied()
            .unwrap_or_default();
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| HttpError::BadRequest(rejection.body_text()))?;
        let fields = MultipartFields::collect_from(multipart, &limits).await?;
        Ok(MultipartForm(fields))
    }
}
