use trellis_core::{
    Controller, ControllerProvider, ControllerRef, Injector, MountedController, Operation,
    ParamMetadata, Platform, PlatformAdapter, PlatformApplication, PlatformError,
    PlatformRouter, Verb,
};

// ── Recording adapter ───────────────────────────────────────────────────

type Handler = &'static str;

#[derive(Debug, Clone, Default, PartialEq)]
struct RecordingRouter {
    operations: Vec<(Verb, String, Handler)>,
    children: Vec<(String, RecordingRouter)>,
}

impl PlatformRouter for RecordingRouter {
    type Handler = Handler;
    type Raw = RecordingRouter;

    fn add_operation(&mut self, verb: Verb, path: &str, handler: Handler) -> Result<(), PlatformError> {
        if !path.is_empty() && !path.starts_with('/') {
            return Err(PlatformError::InvalidPath {
                path: path.to_string(),
                reason: "must start with '/'".into(),
            });
        }
        self.operations.push((verb, path.to_string(), handler));
        Ok(())
    }

    fn use_router(&mut self, path: &str, child: Self) -> Result<(), PlatformError> {
        self.children.push((path.to_string(), child));
        Ok(())
    }

    fn raw(&self) -> &RecordingRouter {
        self
    }
}

#[derive(Debug, Default)]
struct RecordingApp {
    uses: Vec<(String, RecordingRouter)>,
}

impl PlatformApplication for RecordingApp {
    type Router = RecordingRouter;

    fn use_router(&mut self, path: &str, router: RecordingRouter) -> Result<(), PlatformError> {
        self.uses.push((path.to_string(), router));
        Ok(())
    }
}

struct RecordingAdapter;

impl PlatformAdapter for RecordingAdapter {
    type Handler = Handler;
    type Router = RecordingRouter;
    type App = RecordingApp;

    const NAME: &'static str = "recording";

    fn app(&self) -> RecordingApp {
        RecordingApp::default()
    }

    fn router(&self) -> RecordingRouter {
        RecordingRouter::default()
    }
}

// ── Controllers ─────────────────────────────────────────────────────────

struct MyCtrl;

impl Controller<Handler> for MyCtrl {
    fn path() -> &'static str {
        "/my-route"
    }

    fn operations() -> Vec<Operation<Handler>> {
        vec![Operation::get("/", "get", "MyCtrl::get")]
    }
}

struct MySubCtrl;

impl Controller<Handler> for MySubCtrl {
    fn path() -> &'static str {
        "/my-sub-route"
    }

    fn operations() -> Vec<Operation<Handler>> {
        vec![Operation::get("/", "get", "MySubCtrl::get")]
    }
}

struct MyNestedCtrl;

impl Controller<Handler> for MyNestedCtrl {
    fn path() -> &'static str {
        "/my-route"
    }

    fn children() -> Vec<ControllerRef> {
        vec![ControllerRef::of::<MySubCtrl>()]
    }

    fn operations() -> Vec<Operation<Handler>> {
        vec![Operation::get("/", "get", "MyNestedCtrl::get")]
    }
}

/// Plain type without controller metadata.
struct Test;

fn create_platform() -> Platform<RecordingAdapter> {
    let mut injector = Injector::new();
    injector
        .add_controller::<MyCtrl>()
        .add_controller::<MySubCtrl>()
        .add_controller::<MyNestedCtrl>();
    Platform::new(RecordingAdapter, injector)
}

fn provider_of<T: 'static>(platform: &Platform<RecordingAdapter>) -> std::sync::Arc<ControllerProvider<Handler>> {
    platform.injector().get_provider_of::<T>().unwrap()
}

// ── add_route ───────────────────────────────────────────────────────────

#[test]
fn add_route_mounts_a_single_controller() {
    let mut platform = create_platform();
    let provider = provider_of::<MyCtrl>(&platform);

    platform.add_route::<MyCtrl>("/test").unwrap();
    let router = platform.router(&provider.token_router()).unwrap();

    assert_eq!(
        platform.get_mounted_controllers(),
        &[MountedController {
            provider: provider.clone(),
            route: "/test/my-route".into()
        }]
    );
    assert_eq!(
        platform.app().uses,
        vec![("/test/my-route".to_string(), router.raw().clone())]
    );
    assert_eq!(router.operations, vec![(Verb::Get, "/".to_string(), "MyCtrl::get")]);
}

#[test]
fn add_route_mounts_nested_controllers_children_first() {
    let mut platform = create_platform();
    let nested = provider_of::<MyNestedCtrl>(&platform);
    let sub = provider_of::<MySubCtrl>(&platform);

    platform.add_route::<MyNestedCtrl>("/test").unwrap();
    let router = platform.router(&nested.token_router()).unwrap();

    assert_eq!(
        platform.get_mounted_controllers(),
        &[
            MountedController {
                provider: sub.clone(),
                route: "/test/my-route/my-sub-route".into()
            },
            MountedController {
                provider: nested.clone(),
                route: "/test/my-route".into()
            },
        ]
    );

    // Only the top-level router reaches the application driver.
    assert_eq!(platform.app().uses.len(), 1);
    assert_eq!(platform.app().uses[0], ("/test/my-route".to_string(), router.raw().clone()));

    // The child router is nested in the parent at its relative path.
    let sub_router = platform.router(&sub.token_router()).unwrap();
    assert_eq!(router.children, vec![("/my-sub-route".to_string(), sub_router.clone())]);
}

#[test]
fn add_route_ignores_types_without_metadata() {
    let mut platform = create_platform();

    platform.add_route::<Test>("/test-2").unwrap();

    assert!(platform.get_mounted_controllers().is_empty());
    assert!(platform.app().uses.is_empty());
}

#[test]
fn add_route_skips_children_without_metadata() {
    let mut injector = Injector::new();
    injector.add_provider(
        ControllerProvider::builder::<MyCtrl>("/parent")
            .child::<Test>()
            .operation(Operation::get("/", "get", "parent"))
            .build(),
    );
    let mut platform = Platform::new(RecordingAdapter, injector);

    platform.add_route::<MyCtrl>("/").unwrap();

    let routes: Vec<_> = platform
        .get_mounted_controllers()
        .iter()
        .map(|m| m.route.as_str())
        .collect();
    assert_eq!(routes, vec!["/parent"]);
}

#[test]
fn add_route_normalizes_paths() {
    let mut platform = create_platform();

    platform.add_route::<MyCtrl>("").unwrap();
    platform.add_route::<MyCtrl>("/").unwrap();
    platform.add_route::<MyCtrl>("//api//v1/").unwrap();

    let routes: Vec<_> = platform
        .get_mounted_controllers()
        .iter()
        .map(|m| m.route.as_str())
        .collect();
    assert_eq!(routes, vec!["/my-route", "/my-route", "/api/v1/my-route"]);
}

#[test]
fn add_route_twice_does_not_deduplicate() {
    let mut platform = create_platform();

    platform.add_route::<MyNestedCtrl>("/test").unwrap();
    platform.add_route::<MyNestedCtrl>("/test").unwrap();

    assert_eq!(platform.get_mounted_controllers().len(), 4);
    assert_eq!(platform.app().uses.len(), 2);
    assert_eq!(platform.get_routes().len(), 4);
}

#[test]
fn add_routes_mounts_in_order() {
    let mut platform = create_platform();

    platform
        .add_routes(&[
            ("/a", ControllerRef::of::<MyCtrl>()),
            ("/b", ControllerRef::of::<Test>()),
            ("/c", ControllerRef::of::<MySubCtrl>()),
        ])
        .unwrap();

    let paths: Vec<_> = platform.app().uses.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["/a/my-route", "/c/my-sub-route"]);
}

#[test]
fn deep_trees_keep_descendants_before_ancestors() {
    struct Root;
    struct Mid;
    struct Leaf;
    struct Sibling;

    let mut injector: Injector<Handler> = Injector::new();
    injector
        .add_provider(
            ControllerProvider::builder::<Root>("/root")
                .child::<Mid>()
                .child::<Sibling>()
                .build(),
        )
        .add_provider(ControllerProvider::builder::<Mid>("/mid").child::<Leaf>().build())
        .add_provider(ControllerProvider::builder::<Leaf>("/leaf").build())
        .add_provider(ControllerProvider::builder::<Sibling>("/sibling").build());
    let mut platform = Platform::new(RecordingAdapter, injector);

    platform.add_route::<Root>("/api").unwrap();

    let mounted: Vec<_> = platform
        .get_mounted_controllers()
        .iter()
        .map(|m| (m.provider.class_name().to_string(), m.route.clone()))
        .collect();
    assert_eq!(
        mounted,
        vec![
            ("Leaf".to_string(), "/api/root/mid/leaf".to_string()),
            ("Mid".to_string(), "/api/root/mid".to_string()),
            ("Sibling".to_string(), "/api/root/sibling".to_string()),
            ("Root".to_string(), "/api/root".to_string()),
        ]
    );
}

#[test]
fn cyclic_controllers_are_rejected() {
    struct A;
    struct B;

    let mut injector: Injector<Handler> = Injector::new();
    injector
        .add_provider(ControllerProvider::builder::<A>("/a").child::<B>().build())
        .add_provider(ControllerProvider::builder::<B>("/b").child::<A>().build());
    let mut platform = Platform::new(RecordingAdapter, injector);

    let err = platform.add_route::<A>("/").unwrap_err();
    match err {
        PlatformError::CyclicController { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(platform.app().uses.is_empty());
}

#[test]
fn router_errors_propagate_to_the_caller() {
    let mut injector = Injector::new();
    injector.add_provider(
        ControllerProvider::builder::<MyCtrl>("/bad")
            .operation(Operation::get("no-slash", "get", "bad"))
            .build(),
    );
    let mut platform = Platform::new(RecordingAdapter, injector);

    let err = platform.add_route::<MyCtrl>("/").unwrap_err();
    assert!(matches!(err, PlatformError::InvalidPath { .. }));
    assert!(platform.app().uses.is_empty());
}

// ── get_routes ──────────────────────────────────────────────────────────

#[test]
fn get_routes_flattens_mounted_operations() {
    let mut platform = create_platform();

    platform.add_route::<MyCtrl>("/test").unwrap();
    platform.add_route::<Test>("/test-2").unwrap();

    let result: Vec<_> = platform.get_routes().iter().map(|r| r.to_json()).collect();

    assert_eq!(
        result,
        vec![serde_json::json!({
            "className": "MyCtrl",
            "method": "GET",
            "methodClassName": "get",
            "name": "MyCtrl.get()",
            "parameters": [],
            "rawBody": false,
            "url": "/test/my-route/"
        })]
    );
}

#[test]
fn get_routes_follows_mount_then_declaration_order() {
    let mut platform = create_platform();

    platform.add_route::<MyNestedCtrl>("/test").unwrap();

    let urls: Vec<_> = platform
        .get_routes()
        .into_iter()
        .map(|r| (r.name, r.url))
        .collect();
    assert_eq!(
        urls,
        vec![
            ("MySubCtrl.get()".to_string(), "/test/my-route/my-sub-route/".to_string()),
            ("MyNestedCtrl.get()".to_string(), "/test/my-route/".to_string()),
        ]
    );
}

#[test]
fn get_routes_reports_parameters_and_raw_body() {
    struct Users;

    let mut injector: Injector<Handler> = Injector::new();
    injector.add_provider(
        ControllerProvider::builder::<Users>("/users")
            .operation(Operation::get("", "list", "list").param(ParamMetadata::query("page").of::<u32>()))
            .operation(Operation::get("/:id", "get", "get").param(ParamMetadata::path("id").of::<u64>()))
            .operation(Operation::post("/import", "import", "import").raw_body())
            .operation(Operation::delete("/:id", "remove", "remove"))
            .build(),
    );
    let mut platform = Platform::new(RecordingAdapter, injector);
    platform.add_route::<Users>("/rest").unwrap();

    let routes = platform.get_routes();
    let summary: Vec<_> = routes
        .iter()
        .map(|r| (r.method.as_str(), r.url.as_str(), r.raw_body))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GET", "/rest/users/", false),
            ("GET", "/rest/users/:id", false),
            ("POST", "/rest/users/import", true),
            ("DELETE", "/rest/users/:id", false),
        ]
    );

    let json = routes[1].to_json();
    assert_eq!(
        json["parameters"],
        serde_json::json!([{
            "expression": "id",
            "location": "path",
            "required": true,
            "typeName": "u64"
        }])
    );
}

#[test]
fn get_routes_is_an_idempotent_read() {
    let mut platform = create_platform();
    platform.add_route::<MyNestedCtrl>("/test").unwrap();

    assert_eq!(platform.get_routes(), platform.get_routes());
}

#[test]
fn get_routes_reflects_later_mounts() {
    let mut platform = create_platform();

    platform.add_route::<MyCtrl>("/a").unwrap();
    assert_eq!(platform.get_routes().len(), 1);

    platform.add_route::<MySubCtrl>("/b").unwrap();
    let urls: Vec<_> = platform.get_routes().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["/a/my-route/", "/b/my-sub-route/"]);
}

#[test]
fn custom_class_names_are_used_in_descriptors() {
    let mut injector = Injector::new();
    injector.add_provider(
        ControllerProvider::builder::<MyCtrl>("/")
            .name("HealthController")
            .operation(Operation::get("/", "status", "status"))
            .build(),
    );
    let mut platform = Platform::new(RecordingAdapter, injector);
    platform.add_route::<MyCtrl>("/").unwrap();

    let route = &platform.get_routes()[0];
    assert_eq!(route.name, "HealthController.status()");
    assert_eq!(route.url, "/");
}
