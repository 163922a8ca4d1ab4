mod app;
mod platform;

pub use app::{parse_path, resolve_path, PathStep, TestApp, TestRequest, TestResponse};
pub use platform::PlatformTest;
