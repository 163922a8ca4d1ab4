use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::{PlatformAdapter, PlatformApplication, PlatformRouter};
use crate::controller::{ControllerProvider, ControllerRef, RouterToken};
use crate::error::PlatformError;
use crate::injector::Injector;
use crate::path::{join_paths, normalize_path};
use crate::route::PlatformRouteDetails;

/// Record of one controller mounted at a fully resolved route.
pub struct MountedController<H> {
    pub provider: Arc<ControllerProvider<H>>,
    pub route: String,
}

impl<H> Clone for MountedController<H> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            route: self.route.clone(),
        }
    }
}

impl<H> PartialEq for MountedController<H> {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider && self.route == other.route
    }
}

impl<H> fmt::Debug for MountedController<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedController")
            .field("provider", &self.provider.class_name())
            .field("route", &self.route)
            .finish()
    }
}

/// Mounts controller trees onto an adapter's application driver and keeps
/// track of what was mounted where.
///
/// Mounting happens once at startup, from a single thread; the platform is
/// read-only afterwards.
///
/// ```ignore
/// let mut injector = Injector::new();
/// injector.add_controller::<UsersController>();
///
/// let mut platform = Platform::new(PlatformAxum::new(settings), injector);
/// platform.add_route::<UsersController>("/rest")?;
///
/// for route in platform.get_routes() {
///     println!("{} {}", route.method, route.url);
/// }
/// ```
pub struct Platform<A: PlatformAdapter> {
    adapter: A,
    app: A::App,
    injector: Injector<A::Handler>,
    mounted: Vec<MountedController<A::Handler>>,
    routers: HashMap<RouterToken, A::Router>,
}

impl<A: PlatformAdapter> Platform<A> {
    pub fn new(adapter: A, injector: Injector<A::Handler>) -> Self {
        let app = adapter.app();
        debug!(adapter = A::NAME, "Platform created");
        Self {
            adapter,
            app,
            injector,
            mounted: Vec::new(),
            routers: HashMap::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn app(&self) -> &A::App {
        &self.app
    }

    pub fn injector(&self) -> &Injector<A::Handler> {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut Injector<A::Handler> {
        &mut self.injector
    }

    /// Split the platform into its adapter, application driver and injector.
    pub fn into_parts(self) -> (A, A::App, Injector<A::Handler>) {
        (self.adapter, self.app, self.injector)
    }

    /// Mount controller `C` (and its children) below `base_path`.
    ///
    /// Types without registered controller metadata are ignored.
    pub fn add_route<C: 'static>(&mut self, base_path: &str) -> Result<(), PlatformError> {
        self.add_route_ref(base_path, ControllerRef::of::<C>())
    }

    /// Type-erased variant of [`add_route`](Self::add_route).
    pub fn add_route_ref(
        &mut self,
        base_path: &str,
        controller: ControllerRef,
    ) -> Result<(), PlatformError> {
        let Some(provider) = self.injector.get_provider(controller.type_id()) else {
            debug!(
                class = controller.name(),
                base_path, "No controller metadata registered, nothing to mount"
            );
            return Ok(());
        };

        let route = join_paths(base_path, provider.path());
        let router = self.mount(&provider, &route, &mut Vec::new())?;
        self.app.use_router(&route, router)
    }

    /// Mount several controllers in order.
    pub fn add_routes(&mut self, routes: &[(&str, ControllerRef)]) -> Result<(), PlatformError> {
        for (base_path, controller) in routes {
            self.add_route_ref(base_path, *controller)?;
        }
        Ok(())
    }

    /// Every mounted controller, descendants before their ancestors.
    pub fn get_mounted_controllers(&self) -> &[MountedController<A::Handler>] {
        &self.mounted
    }

    /// Flatten the mounted controllers into one descriptor per operation.
    pub fn get_routes(&self) -> Vec<PlatformRouteDetails> {
        self.mounted
            .iter()
            .flat_map(|mounted| {
                mounted
                    .provider
                    .operations()
                    .iter()
                    .map(|op| PlatformRouteDetails::new(&mounted.provider, op, &mounted.route))
            })
            .collect()
    }

    /// The router most recently built for the controller owning `token`.
    pub fn router(&self, token: &RouterToken) -> Option<&A::Router> {
        self.routers.get(token)
    }

    /// Log the route table, one event per endpoint.
    pub fn log_routes(&self) {
        let routes = self.get_routes();
        info!(adapter = A::NAME, count = routes.len(), "Routes mounted");
        for route in &routes {
            info!(method = %route.method, url = %route.url, handler = %route.name, "Route");
        }
    }

    /// Build the router of `provider`, children first, and record the mount.
    fn mount(
        &mut self,
        provider: &Arc<ControllerProvider<A::Handler>>,
        route: &str,
        ancestors: &mut Vec<(TypeId, String)>,
    ) -> Result<A::Router, PlatformError> {
        if ancestors.iter().any(|(id, _)| *id == provider.type_id()) {
            let mut chain: Vec<String> = ancestors.iter().map(|(_, name)| name.clone()).collect();
            chain.push(provider.class_name().to_string());
            return Err(PlatformError::CyclicController { chain });
        }
        ancestors.push((provider.type_id(), provider.class_name().to_string()));

        let mut router = self.adapter.router();

        for child in provider.children() {
            let Some(child_provider) = self.injector.get_provider(child.type_id()) else {
                debug!(
                    parent = provider.class_name(),
                    child = child.name(),
                    "Child has no controller metadata, skipping"
                );
                continue;
            };
            let child_route = join_paths(route, child_provider.path());
            let child_router = self.mount(&child_provider, &child_route, ancestors)?;
            router.use_router(&normalize_path(child_provider.path()), child_router)?;
        }

        for operation in provider.operations() {
            router.add_operation(operation.verb, &operation.path, operation.handler.clone())?;
        }

        ancestors.pop();

        debug!(controller = provider.class_name(), route, "Controller mounted");
        self.mounted.push(MountedController {
            provider: Arc::clone(provider),
            route: route.to_string(),
        });
        self.routers.insert(provider.token_router(), router.clone());
        Ok(router)
    }
}
