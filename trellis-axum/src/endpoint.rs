use axum::handler::Handler;
use axum::routing::{self, MethodRouter};
use trellis_core::{Operation, Verb};

/// Wrap an axum handler in a [`MethodRouter`] answering `verb`.
pub fn method_router<H, T, S>(verb: Verb, handler: H) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    match verb {
        Verb::Get => routing::get(handler),
        Verb::Post => routing::post(handler),
        Verb::Put => routing::put(handler),
        Verb::Patch => routing::patch(handler),
        Verb::Delete => routing::delete(handler),
        Verb::Head => routing::head(handler),
        Verb::Options => routing::options(handler),
        Verb::All => routing::any(handler),
    }
}

/// Declare an operation served by an axum handler.
///
/// ```ignore
/// endpoint(Verb::Get, "/:id", "get", get_user)
///     .param(ParamMetadata::path("id").required())
/// ```
pub fn endpoint<H, T, S>(
    verb: Verb,
    path: impl Into<String>,
    method_name: impl Into<String>,
    handler: H,
) -> Operation<MethodRouter<S>>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    Operation::new(verb, path, method_name, method_router(verb, handler))
}
