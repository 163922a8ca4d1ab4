//! Axum binding for the Trellis platform.
//!
//! [`PlatformAxum`] implements the core adapter traits on top of
//! `axum::Router`, and [`PlatformAxum::build`] turns a mounted
//! [`Platform`](trellis_core::Platform) into the request listener, wrapped in
//! the per-request context middleware.

pub mod adapter;
pub mod body;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod exceptions;
pub mod multipart;
pub mod request;
pub mod server;
pub mod settings;

pub use adapter::{AxumApplication, AxumRouter, PlatformAxum};
pub use body::{ParsedBody, RawBody};
pub use context::PlatformContext;
pub use endpoint::{endpoint, method_router};
pub use error::HttpError;
pub use exceptions::{Exception, ExceptionHandler, PlatformExceptions};
pub use multipart::{MultipartError, MultipartFields, MultipartForm, UploadedFile};
pub use request::{PlatformRequest, PlatformResponse};
pub use settings::{AxumSettings, MultipartSettings, StaticsOptions};

/// Handler type carried by operations served through [`PlatformAxum`].
pub type AxumHandler<S = ()> = axum::routing::MethodRouter<S>;
