//! Capability traits a concrete HTTP library implements to host a
//! [`Platform`](crate::platform::Platform).
//!
//! The core only needs three things from an adapter: a factory for nestable
//! routers, a factory for the application driver, and the driver's mount
//! primitive. Request-level concerns (body parsing, request context, error
//! mapping) stay inside the adapter crate.

use crate::controller::Verb;
use crate::error::PlatformError;

/// Binds the framework to one HTTP library.
pub trait PlatformAdapter: Sized + Send + Sync + 'static {
    /// Per-operation handler type carried by [`Operation`](crate::controller::Operation).
    type Handler: Clone + Send + Sync + 'static;
    /// Router built for each mounted controller.
    type Router: PlatformRouter<Handler = Self::Handler>;
    /// Top-level application driver.
    type App: PlatformApplication<Router = Self::Router>;

    /// Adapter name, used in logs.
    const NAME: &'static str;

    /// Create the application driver.
    fn app(&self) -> Self::App;

    /// Create an empty, isolated router.
    fn router(&self) -> Self::Router;
}

/// A nestable router.
pub trait PlatformRouter: Clone + Send + 'static {
    type Handler;
    /// Native router object of the underlying library.
    type Raw;

    /// Register `handler` for `verb` at `path`, relative to this router.
    fn add_operation(
        &mut self,
        verb: Verb,
        path: &str,
        handler: Self::Handler,
    ) -> Result<(), PlatformError>;

    /// Mount `child` below this router at `path`.
    fn use_router(&mut self, path: &str, child: Self) -> Result<(), PlatformError>;

    /// Borrow the native router.
    fn raw(&self) -> &Self::Raw;
}

/// The application driver: the root every top-level router is mounted on.
pub trait PlatformApplication: Send + 'static {
    type Router: PlatformRouter;

    /// Mount `router` at the absolute `path`.
    fn use_router(&mut self, path: &str, router: Self::Router) -> Result<(), PlatformError>;
}
