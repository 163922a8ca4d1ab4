use axum::routing::MethodRouter;
use trellis_axum::{AxumSettings, PlatformAxum};
use trellis_core::{
    Controller, ControllerProvider, ControllerRef, Injector, Platform, PlatformError,
};

use crate::app::TestApp;

/// Fixture assembling a fresh axum platform for one test.
///
/// ```ignore
/// let app = PlatformTest::create()
///     .controller::<UsersController>()
///     .mount::<UsersController>("/rest")
///     .bootstrap()?;
/// app.get("/rest/users").send().await.assert_ok();
/// ```
pub struct PlatformTest<S = ()> {
    settings: AxumSettings,
    injector: Injector<MethodRouter<S>>,
    mounts: Vec<(String, ControllerRef)>,
    state: S,
}

impl PlatformTest<()> {
    pub fn create() -> Self {
        Self::with_state(())
    }
}

impl<S: Clone + Send + Sync + 'static> PlatformTest<S> {
    pub fn with_state(state: S) -> Self {
        Self {
            settings: AxumSettings::default(),
            injector: Injector::new(),
            mounts: Vec::new(),
            state,
        }
    }

    pub fn settings(mut self, settings: AxumSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Register the metadata of a controller.
    pub fn controller<C: Controller<MethodRouter<S>>>(mut self) -> Self {
        self.injector.add_controller::<C>();
        self
    }

    pub fn provider(mut self, provider: ControllerProvider<MethodRouter<S>>) -> Self {
        self.injector.add_provider(provider);
        self
    }

    /// Store an instance in the injector, e.g. an `Arc<dyn ExceptionHandler>`.
    pub fn provide<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.injector.provide(value);
        self
    }

    /// Mount `C` under `base_path` when the platform is built.
    pub fn mount<C: 'static>(mut self, base_path: &str) -> Self {
        self.mounts
            .push((base_path.to_string(), ControllerRef::of::<C>()));
        self
    }

    /// Create the platform and run every recorded mount, in order.
    pub fn platform(self) -> Result<(Platform<PlatformAxum<S>>, S), PlatformError> {
        let mut platform = PlatformAxum::create(self.settings, self.injector);
        for (base_path, controller) in &self.mounts {
            platform.add_route_ref(base_path, *controller)?;
        }
        Ok((platform, self.state))
    }

    /// Create the platform and wrap its request listener in a [`TestApp`].
    pub fn bootstrap(self) -> Result<TestApp, PlatformError> {
        let (platform, state) = self.platform()?;
        Ok(TestApp::from_platform(platform, state))
    }
}
