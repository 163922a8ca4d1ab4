pub mod adapter;
pub mod config;
pub mod controller;
pub mod error;
pub mod injector;
pub mod layers;
pub mod path;
pub mod platform;
pub mod route;

pub use adapter::{PlatformAdapter, PlatformApplication, PlatformRouter};
pub use config::{ConfigError, ConfigValue, FromConfigValue, TrellisConfig};
pub use controller::{
    Controller, ControllerProvider, ControllerProviderBuilder, ControllerRef, Operation,
    ParamLocation, ParamMetadata, RouterToken, Verb,
};
pub use error::PlatformError;
pub use injector::Injector;
pub use layers::init_tracing;
pub use platform::{MountedController, Platform};
pub use route::PlatformRouteDetails;
