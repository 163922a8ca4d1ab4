use crate::config::ConfigError;
use crate::controller::Verb;

/// Errors raised while bootstrapping a platform.
///
/// Mount errors come from the adapter's router driver and abort the
/// bootstrap sequence: they are returned from
/// [`Platform::add_route`](crate::platform::Platform::add_route) unchanged.
#[derive(Debug)]
pub enum PlatformError {
    /// The router driver rejected a path.
    InvalidPath { path: String, reason: String },
    /// The same verb and path were registered twice on one router.
    DuplicateRoute { verb: Verb, path: String },
    /// Two routers were mounted at the same path on one parent.
    DuplicateMount { path: String },
    /// A controller is listed among its own descendants.
    CyclicController { chain: Vec<String> },
    /// Invalid or missing configuration.
    Config(ConfigError),
    /// Binding or serving failed.
    Io(std::io::Error),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::InvalidPath { path, reason } => {
                write!(f, "Invalid route path '{path}': {reason}")
            }
            PlatformError::DuplicateRoute { verb, path } => {
                write!(f, "Route {verb} '{path}' is already registered on this router")
            }
            PlatformError::DuplicateMount { path } => {
                write!(f, "A router is already mounted at '{path}'")
            }
            PlatformError::CyclicController { chain } => {
                write!(f, "Controller cycle detected: {}", chain.join(" -> "))
            }
            PlatformError::Config(err) => write!(f, "{err}"),
            PlatformError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Config(err) => Some(err),
            PlatformError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for PlatformError {
    fn from(err: ConfigError) -> Self {
        PlatformError::Config(err)
    }
}

impl From<std::io::Error> for PlatformError {
    fn from(err: std::io::Error) -> Self {
        PlatformError::Io(err)
    }
}
