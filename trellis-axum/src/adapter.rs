use std::collections::HashSet;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use axum::routing::MethodRouter;
use axum::Router;
use tracing::debug;
use trellis_core::{PlatformAdapter, PlatformApplication, PlatformError, PlatformRouter, Verb};

use crate::context::{mark_handled, panic_message};
use crate::settings::AxumSettings;

/// Adapter serving a [`Platform`](trellis_core::Platform) with axum.
///
/// `S` is the application state handed to handlers through
/// `axum::extract::State`.
pub struct PlatformAxum<S = ()> {
    pub(crate) settings: AxumSettings,
    _state: PhantomData<fn() -> S>,
}

impl<S> PlatformAxum<S> {
    pub fn new(settings: AxumSettings) -> Self {
        Self {
            settings,
            _state: PhantomData,
        }
    }

    pub fn settings(&self) -> &AxumSettings {
        &self.settings
    }
}

impl<S> Default for PlatformAxum<S> {
    fn default() -> Self {
        Self::new(AxumSettings::default())
    }
}

impl<S: Clone + Send + Sync + 'static> PlatformAdapter for PlatformAxum<S> {
    type Handler = MethodRouter<S>;
    type Router = AxumRouter<S>;
    type App = AxumApplication<S>;

    const NAME: &'static str = "axum";

    fn app(&self) -> AxumApplication<S> {
        AxumApplication::with_router(self.router())
    }

    fn router(&self) -> AxumRouter<S> {
        AxumRouter::new().strict(self.settings.strict)
    }
}

// ── Router ──────────────────────────────────────────────────────────────

struct RouteEntry<S> {
    verb: Verb,
    path: String,
    handler: MethodRouter<S>,
}

impl<S> Clone for RouteEntry<S> {
    fn clone(&self) -> Self {
        Self {
            verb: self.verb,
            path: self.path.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// Router built for one controller.
///
/// Child routers are flattened into their parent: every operation is kept
/// with its full path so conflicts anywhere in the tree are reported as
/// [`PlatformError`]s before axum sees them. In strict mode a child's root
/// operation is served at `<prefix>/`, the URL the route table reports.
pub struct AxumRouter<S = ()> {
    inner: Router<S>,
    routes: Vec<RouteEntry<S>>,
    mounts: HashSet<String>,
    strict: bool,
}

impl<S: Clone + Send + Sync + 'static> AxumRouter<S> {
    pub fn new() -> Self {
        Self {
            inner: Router::new(),
            routes: Vec::new(),
            mounts: HashSet::new(),
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn into_inner(self) -> Router<S> {
        self.inner
    }

    /// Served paths, in registration order.
    pub fn paths(&self) -> impl Iterator<Item = (Verb, &str)> {
        self.routes.iter().map(|r| (r.verb, r.path.as_str()))
    }

    fn check_route(&self, verb: Verb, path: &str) -> Result<(), PlatformError> {
        let conflict = self.routes.iter().any(|r| {
            r.path == path && (r.verb == verb || r.verb == Verb::All || verb == Verb::All)
        });
        if conflict {
            return Err(PlatformError::DuplicateRoute {
                verb,
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Add `handler` to the axum router. Conflicts axum still refuses, such
    /// as two parameter names at the same position, become `InvalidPath`.
    fn register(&mut self, entry: RouteEntry<S>) -> Result<(), PlatformError> {
        self.check_route(entry.verb, &entry.path)?;
        let router = self.inner.clone();
        let handler = entry.handler.clone();
        let routed = panic::catch_unwind(AssertUnwindSafe(|| router.route(&entry.path, handler)))
            .map_err(|payload| PlatformError::InvalidPath {
                path: entry.path.clone(),
                reason: panic_message(payload),
            })?;
        self.inner = routed;
        self.routes.push(entry);
        Ok(())
    }

    fn nested_path(&self, prefix: &str, path: &str) -> String {
        match (prefix.is_empty(), path) {
            (true, _) => path.to_string(),
            (false, "/") if self.strict => format!("{prefix}/"),
            (false, "/") => prefix.to_string(),
            (false, _) => format!("{prefix}{path}"),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> Default for AxumRouter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + 'static> Clone for AxumRouter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            routes: self.routes.clone(),
            mounts: self.mounts.clone(),
            strict: self.strict,
        }
    }
}

impl<S: Clone + Send + Sync + 'static> PlatformRouter for AxumRouter<S> {
    type Handler = MethodRouter<S>;
    type Raw = Router<S>;

    fn add_operation(
        &mut self,
        verb: Verb,
        path: &str,
        handler: MethodRouter<S>,
    ) -> Result<(), PlatformError> {
        let path = to_axum_path(path)?;
        let handler = handler.route_layer(axum::middleware::from_fn(mark_handled));
        self.register(RouteEntry { verb, path, handler })
    }

    fn use_router(&mut self, path: &str, child: Self) -> Result<(), PlatformError> {
        let prefix = to_axum_path(path)?;
        let prefix = prefix.trim_end_matches('/');

        let mut mounts: Vec<String> = child
            .mounts
            .iter()
            .map(|m| format!("{prefix}{m}"))
            .collect();
        if !prefix.is_empty() {
            mounts.insert(0, prefix.to_string());
        }
        if let Some(taken) = mounts.iter().find(|m| self.mounts.contains(*m)) {
            return Err(PlatformError::DuplicateMount {
                path: taken.clone(),
            });
        }

        let entries: Vec<RouteEntry<S>> = child
            .routes
            .into_iter()
            .map(|entry| RouteEntry {
                path: self.nested_path(prefix, &entry.path),
                ..entry
            })
            .collect();
        for entry in &entries {
            self.check_route(entry.verb, &entry.path)?;
        }

        self.mounts.extend(mounts);
        for entry in entries {
            self.register(entry)?;
        }
        Ok(())
    }

    fn raw(&self) -> &Router<S> {
        &self.inner
    }
}

// ── Application ─────────────────────────────────────────────────────────

/// Application driver: the root router every top-level controller router is
/// mounted on.
pub struct AxumApplication<S = ()> {
    router: AxumRouter<S>,
    mounts: Vec<String>,
}

impl<S: Clone + Send + Sync + 'static> AxumApplication<S> {
    pub fn new() -> Self {
        Self::with_router(AxumRouter::new())
    }

    pub fn with_router(router: AxumRouter<S>) -> Self {
        Self {
            router,
            mounts: Vec::new(),
        }
    }

    pub fn router(&self) -> &AxumRouter<S> {
        &self.router
    }

    /// Paths passed to [`use_router`](PlatformApplication::use_router), in call order.
    pub fn mounts(&self) -> &[String] {
        &self.mounts
    }

    /// Merge a hand-written axum router next to the mounted controllers.
    ///
    /// Its routes go through the context middleware but are not reported by
    /// [`Platform::get_routes`](trellis_core::Platform::get_routes).
    pub fn merge(&mut self, router: Router<S>) {
        let root = std::mem::take(&mut self.router.inner);
        self.router.inner = root.merge(router);
    }

    pub fn into_router(self) -> Router<S> {
        self.router.inner
    }
}

impl<S: Clone + Send + Sync + 'static> Default for AxumApplication<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + 'static> PlatformApplication for AxumApplication<S> {
    type Router = AxumRouter<S>;

    fn use_router(&mut self, path: &str, router: AxumRouter<S>) -> Result<(), PlatformError> {
        self.router.use_router(path, router)?;
        debug!(path, "Router mounted on application");
        self.mounts.push(path.to_string());
        Ok(())
    }
}

// ── Paths ───────────────────────────────────────────────────────────────

/// Translate a declared path into axum's syntax.
///
/// `:name` becomes `{name}`, `*` becomes `{*wildcard}` and `*name` becomes
/// `{*name}`. Segments already written in axum syntax are kept. The empty
/// path maps to `/`.
pub fn to_axum_path(path: &str) -> Result<String, PlatformError> {
    let invalid = |reason: &str| PlatformError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(path.len() + 2);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("parameter name is empty"));
            }
            if name.ends_with('?') {
                return Err(invalid("optional parameters are not supported"));
            }
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if let Some(name) = segment.strip_prefix('*') {
            out.push_str("{*");
            out.push_str(if name.is_empty() { "wildcard" } else { name });
            out.push('}');
        } else {
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push('/');
    } else if path.ends_with('/') {
        out.push('/');
    }
    Ok(out)
}
