use axum::routing::{get, post, MethodRouter};
use trellis_axum::adapter::to_axum_path;
use trellis_axum::{endpoint, AxumApplication, AxumRouter, PlatformAxum};
use trellis_core::{
    Controller, Injector, Operation, ParamMetadata, PlatformAdapter, PlatformApplication,
    PlatformError, PlatformRouter, Verb,
};

async fn ok() -> &'static str {
    "ok"
}

// ── Path translation ────────────────────────────────────────────────────

#[test]
fn translates_named_parameters() {
    assert_eq!(to_axum_path("/users/:id").unwrap(), "/users/{id}");
    assert_eq!(
        to_axum_path("/users/:id/roles/:role").unwrap(),
        "/users/{id}/roles/{role}"
    );
}

#[test]
fn translates_wildcards() {
    assert_eq!(to_axum_path("/files/*").unwrap(), "/files/{*wildcard}");
    assert_eq!(to_axum_path("/files/*path").unwrap(), "/files/{*path}");
}

#[test]
fn keeps_axum_syntax_and_root() {
    assert_eq!(to_axum_path("/users/{id}").unwrap(), "/users/{id}");
    assert_eq!(to_axum_path("").unwrap(), "/");
    assert_eq!(to_axum_path("/").unwrap(), "/");
    assert_eq!(to_axum_path("users").unwrap(), "/users");
    assert_eq!(to_axum_path("/users/").unwrap(), "/users/");
}

#[test]
fn rejects_optional_and_unnamed_parameters() {
    assert!(matches!(
        to_axum_path("/users/:id?"),
        Err(PlatformError::InvalidPath { .. })
    ));
    assert!(matches!(
        to_axum_path("/users/:"),
        Err(PlatformError::InvalidPath { .. })
    ));
}

// ── Router ──────────────────────────────────────────────────────────────

#[test]
fn same_path_with_different_verbs_is_accepted() {
    let mut router = AxumRouter::<()>::new();
    router.add_operation(Verb::Get, "/", get(ok)).unwrap();
    router.add_operation(Verb::Post, "/", post(ok)).unwrap();
}

#[test]
fn duplicate_verb_and_path_is_rejected() {
    let mut router = AxumRouter::<()>::new();
    router.add_operation(Verb::Get, "/:id", get(ok)).unwrap();

    let err = router.add_operation(Verb::Get, "/:id", get(ok)).unwrap_err();
    match err {
        PlatformError::DuplicateRoute { verb, path } => {
            assert_eq!(verb, Verb::Get);
            assert_eq!(path, "/{id}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn all_conflicts_with_every_verb() {
    let mut router = AxumRouter::<()>::new();
    router.add_operation(Verb::Get, "/", get(ok)).unwrap();

    let err = router
        .add_operation(Verb::All, "/", axum::routing::any(ok))
        .unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateRoute { verb: Verb::All, .. }));
}

#[test]
fn nesting_twice_at_the_same_path_is_rejected() {
    let mut router = AxumRouter::<()>::new();
    router.use_router("/sub", AxumRouter::new()).unwrap();

    let err = router.use_router("/sub/", AxumRouter::new()).unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateMount { path } if path == "/sub"));
}

#[test]
fn merging_at_root_checks_child_operations() {
    let mut child = AxumRouter::<()>::new();
    child.add_operation(Verb::Get, "/health", get(ok)).unwrap();

    let mut parent = AxumRouter::<()>::new();
    parent.add_operation(Verb::Get, "/health", get(ok)).unwrap();

    let err = parent.use_router("/", child).unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateRoute { .. }));
}

#[test]
fn parent_operation_over_a_nested_root_is_rejected() {
    let mut child = AxumRouter::<()>::new();
    child.add_operation(Verb::Get, "/", get(ok)).unwrap();

    let mut parent = AxumRouter::<()>::new();
    parent.use_router("/sub", child).unwrap();

    let err = parent.add_operation(Verb::Get, "/sub", get(ok)).unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateRoute { verb: Verb::Get, path } if path == "/sub"));
    parent.add_operation(Verb::Post, "/sub", post(ok)).unwrap();
}

#[test]
fn nested_operations_keep_their_full_path() {
    let mut grandchild = AxumRouter::<()>::new();
    grandchild.add_operation(Verb::Get, "/", get(ok)).unwrap();

    let mut child = AxumRouter::<()>::new();
    child.use_router("/roles", grandchild).unwrap();
    child.add_operation(Verb::Get, "/:id", get(ok)).unwrap();

    let mut parent = AxumRouter::<()>::new();
    parent.use_router("/users", child).unwrap();

    let paths: Vec<_> = parent.paths().collect();
    assert_eq!(paths, [(Verb::Get, "/users/roles"), (Verb::Get, "/users/{id}")]);

    let err = parent.use_router("/users/roles", AxumRouter::new()).unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateMount { path } if path == "/users/roles"));
}

#[test]
fn strict_routers_serve_nested_roots_with_a_trailing_slash() {
    let mut child = AxumRouter::<()>::new().strict(true);
    child.add_operation(Verb::Get, "/", get(ok)).unwrap();
    child.add_operation(Verb::Get, "/:id", get(ok)).unwrap();

    let mut parent = AxumRouter::<()>::new().strict(true);
    parent.use_router("/users", child).unwrap();
    parent.add_operation(Verb::Get, "/users", get(ok)).unwrap();

    let paths: Vec<_> = parent.paths().collect();
    assert_eq!(
        paths,
        [
            (Verb::Get, "/users/"),
            (Verb::Get, "/users/{id}"),
            (Verb::Get, "/users"),
        ]
    );
}

#[test]
fn conflicting_parameter_names_are_reported() {
    let mut router = AxumRouter::<()>::new();
    router.add_operation(Verb::Get, "/:id", get(ok)).unwrap();

    let err = router.add_operation(Verb::Post, "/:name", post(ok)).unwrap_err();
    assert!(matches!(err, PlatformError::InvalidPath { path, .. } if path == "/{name}"));
}

// ── Application ─────────────────────────────────────────────────────────

#[test]
fn application_records_mount_order() {
    let mut app = AxumApplication::<()>::new();
    app.use_router("/b", AxumRouter::new()).unwrap();
    app.use_router("/a", AxumRouter::new()).unwrap();

    assert_eq!(app.mounts(), ["/b".to_string(), "/a".to_string()]);
    assert!(app.use_router("/a", AxumRouter::new()).is_err());
    assert_eq!(app.mounts().len(), 2);
}

#[test]
fn adapter_creates_fresh_routers() {
    let adapter = PlatformAxum::<()>::default();
    assert_eq!(PlatformAxum::<()>::NAME, "axum");

    let mut first = adapter.router();
    first.add_operation(Verb::Get, "/", get(ok)).unwrap();

    // A second router does not share the first one's bookkeeping.
    let mut second = adapter.router();
    second.add_operation(Verb::Get, "/", get(ok)).unwrap();
}

// ── Platform over axum ──────────────────────────────────────────────────

struct Users;

impl Controller<MethodRouter> for Users {
    fn path() -> &'static str {
        "/users"
    }

    fn operations() -> Vec<Operation<MethodRouter>> {
        vec![
            endpoint(Verb::Get, "/", "list", ok),
            endpoint(Verb::Get, "/:id", "get", ok).param(ParamMetadata::path("id").required()),
        ]
    }
}

struct Broken;

impl Controller<MethodRouter> for Broken {
    fn path() -> &'static str {
        "/broken"
    }

    fn operations() -> Vec<Operation<MethodRouter>> {
        vec![endpoint(Verb::Get, "/:id?", "get", ok)]
    }
}

fn injector() -> Injector<MethodRouter> {
    let mut injector = Injector::new();
    injector.add_controller::<Users>().add_controller::<Broken>();
    injector
}

#[test]
fn routes_keep_the_declared_path_syntax() {
    let mut platform = PlatformAxum::create(Default::default(), injector());
    platform.add_route::<Users>("/rest").unwrap();

    let urls: Vec<_> = platform.get_routes().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, ["/rest/users/", "/rest/users/:id"]);
}

#[test]
fn mounting_the_same_controller_twice_fails_on_the_driver() {
    let mut platform = PlatformAxum::create(Default::default(), injector());
    platform.add_route::<Users>("/rest").unwrap();

    let err = platform.add_route::<Users>("/rest").unwrap_err();
    assert!(matches!(err, PlatformError::DuplicateMount { path } if path == "/rest/users"));
}

#[test]
fn invalid_operation_path_aborts_the_mount() {
    let mut platform = PlatformAxum::create(Default::default(), injector());

    let err = platform.add_route::<Broken>("/").unwrap_err();
    assert!(matches!(err, PlatformError::InvalidPath { path, .. } if path == "/:id?"));
}
