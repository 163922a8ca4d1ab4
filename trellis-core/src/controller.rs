//! Controller metadata: what a controller declares and how it is looked up.
//!
//! A controller is any `'static` type. Its metadata is either described by
//! implementing [`Controller`] or assembled explicitly with
//! [`ControllerProvider::builder`]. Both produce a [`ControllerProvider`]
//! that the [`Injector`](crate::injector::Injector) stores and the
//! [`Platform`](crate::platform::Platform) mounts.

use serde::Serialize;
use std::any::{type_name, TypeId};
use std::fmt;

// ── Verbs and parameters ────────────────────────────────────────────────────

/// HTTP verb an operation answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Matches every method.
    All,
}

impl Verb {
    /// Uppercase name, as reported in route descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::All => "ALL",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a bound parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
    RawBody,
    Context,
    Request,
    Response,
}

/// Descriptor of one parameter bound by an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamMetadata {
    /// Name of the value in its location (`"id"`, `"x-api-key"`, ...).
    pub expression: String,
    pub location: ParamLocation,
    pub required: bool,
    pub type_name: String,
}

impl ParamMetadata {
    pub fn new(location: ParamLocation, expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            location,
            required: false,
            type_name: String::new(),
        }
    }

    pub fn path(expression: impl Into<String>) -> Self {
        Self::new(ParamLocation::Path, expression).required()
    }

    pub fn query(expression: impl Into<String>) -> Self {
        Self::new(ParamLocation::Query, expression)
    }

    pub fn header(expression: impl Into<String>) -> Self {
        Self::new(ParamLocation::Header, expression)
    }

    pub fn body() -> Self {
        Self::new(ParamLocation::Body, "")
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Record the Rust type the parameter is extracted into.
    pub fn of<T: ?Sized>(mut self) -> Self {
        self.type_name = short_type_name(type_name::<T>()).to_string();
        self
    }
}

// ── Operations ──────────────────────────────────────────────────────────────

/// One HTTP operation declared on a controller, together with the
/// adapter-specific handler `H` that serves it.
#[derive(Clone)]
pub struct Operation<H> {
    pub verb: Verb,
    /// Path relative to the controller.
    pub path: String,
    /// Identifier of the operation on its controller.
    pub method_name: String,
    pub parameters: Vec<ParamMetadata>,
    /// Whether the operation consumes the unparsed request body.
    pub raw_body: bool,
    pub handler: H,
}

impl<H> Operation<H> {
    pub fn new(verb: Verb, path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self {
            verb,
            path: path.into(),
            method_name: method_name.into(),
            parameters: Vec::new(),
            raw_body: false,
            handler,
        }
    }

    pub fn get(path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self::new(Verb::Get, path, method_name, handler)
    }

    pub fn post(path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self::new(Verb::Post, path, method_name, handler)
    }

    pub fn put(path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self::new(Verb::Put, path, method_name, handler)
    }

    pub fn patch(path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self::new(Verb::Patch, path, method_name, handler)
    }

    pub fn delete(path: impl Into<String>, method_name: impl Into<String>, handler: H) -> Self {
        Self::new(Verb::Delete, path, method_name, handler)
    }

    /// Append a bound parameter descriptor.
    pub fn param(mut self, param: ParamMetadata) -> Self {
        self.parameters.push(param);
        self
    }

    /// Mark the operation as reading the raw request body.
    pub fn raw_body(mut self) -> Self {
        self.raw_body = true;
        self
    }

    /// Swap the handler while keeping the metadata.
    pub fn map_handler<H2>(self, f: impl FnOnce(H) -> H2) -> Operation<H2> {
        Operation {
            verb: self.verb,
            path: self.path,
            method_name: self.method_name,
            parameters: self.parameters,
            raw_body: self.raw_body,
            handler: f(self.handler),
        }
    }
}

impl<H> fmt::Debug for Operation<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("method_name", &self.method_name)
            .field("parameters", &self.parameters)
            .field("raw_body", &self.raw_body)
            .finish_non_exhaustive()
    }
}

// ── References and tokens ───────────────────────────────────────────────────

/// Type-erased reference to a (possibly non-controller) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerRef {
    type_id: TypeId,
    type_name: &'static str,
}

impl ControllerRef {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Short name of the referenced type (module path stripped).
    pub fn name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

/// Handle identifying the router built for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouterToken {
    controller: ControllerRef,
}

impl RouterToken {
    pub fn controller(&self) -> ControllerRef {
        self.controller
    }
}

impl fmt::Display for RouterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "router:{}", self.controller.name())
    }
}

/// Strip the module path and generic arguments from a `type_name` string.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ── Controller trait ────────────────────────────────────────────────────────

/// Declares a type as a controller served through handlers of type `H`.
///
/// ```ignore
/// struct UsersController;
///
/// impl Controller<MethodRouter<AppState>> for UsersController {
///     fn path() -> &'static str {
///         "/users"
///     }
///
///     fn children() -> Vec<ControllerRef> {
///         vec![ControllerRef::of::<UserRolesController>()]
///     }
///
///     fn operations() -> Vec<Operation<MethodRouter<AppState>>> {
///         vec![endpoint(Verb::Get, "/", "list", list_users)]
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a controller for this adapter",
    label = "this type does not implement `Controller<{H}>`",
    note = "implement `Controller` or register the type with `ControllerProvider::builder`"
)]
pub trait Controller<H>: 'static {
    /// Mount path, relative to the parent controller or the base path.
    fn path() -> &'static str;

    /// Child controllers, mounted below this one in declaration order.
    fn children() -> Vec<ControllerRef> {
        Vec::new()
    }

    /// Operations in declaration order.
    fn operations() -> Vec<Operation<H>>;
}

// ── ControllerProvider ──────────────────────────────────────────────────────

/// Metadata record of one controller type.
pub struct ControllerProvider<H> {
    controller: ControllerRef,
    class_name: String,
    path: String,
    children: Vec<ControllerRef>,
    operations: Vec<Operation<H>>,
}

impl<H> ControllerProvider<H> {
    /// Build the provider of a type implementing [`Controller`].
    pub fn of<C: Controller<H>>() -> Self {
        Self::builder::<C>(C::path())
            .children(C::children())
            .operations(C::operations())
            .build()
    }

    /// Start describing controller `C` mounted at `path`.
    pub fn builder<C: 'static>(path: impl Into<String>) -> ControllerProviderBuilder<H> {
        let controller = ControllerRef::of::<C>();
        ControllerProviderBuilder {
            provider: ControllerProvider {
                controller,
                class_name: controller.name().to_string(),
                path: path.into(),
                children: Vec::new(),
                operations: Vec::new(),
            },
        }
    }

    pub fn controller(&self) -> ControllerRef {
        self.controller
    }

    pub fn type_id(&self) -> TypeId {
        self.controller.type_id()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> &[ControllerRef] {
        &self.children
    }

    pub fn operations(&self) -> &[Operation<H>] {
        &self.operations
    }

    pub fn token_router(&self) -> RouterToken {
        RouterToken {
            controller: self.controller,
        }
    }
}

impl<H> PartialEq for ControllerProvider<H> {
    fn eq(&self, other: &Self) -> bool {
        self.controller == other.controller
    }
}

impl<H> fmt::Debug for ControllerProvider<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerProvider")
            .field("class_name", &self.class_name)
            .field("path", &self.path)
            .field("children", &self.children.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("operations", &self.operations)
            .finish()
    }
}

/// Explicit registration API for controller metadata.
pub struct ControllerProviderBuilder<H> {
    provider: ControllerProvider<H>,
}

impl<H> ControllerProviderBuilder<H> {
    /// Override the class name reported in route descriptors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.provider.class_name = name.into();
        self
    }

    pub fn child<C: 'static>(mut self) -> Self {
        self.provider.children.push(ControllerRef::of::<C>());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ControllerRef>) -> Self {
        self.provider.children.extend(children);
        self
    }

    pub fn operation(mut self, operation: Operation<H>) -> Self {
        self.provider.operations.push(operation);
        self
    }

    pub fn operations(mut self, operations: impl IntoIterator<Item = Operation<H>>) -> Self {
        self.provider.operations.extend(operations);
        self
    }

    pub fn build(self) -> ControllerProvider<H> {
        self.provider
    }
}
