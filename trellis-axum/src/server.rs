use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::{Extension, Router};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use trellis_core::{Injector, Platform, PlatformError};

use crate::adapter::PlatformAxum;
use crate::context::context_middleware;
use crate::exceptions::{ExceptionHandler, PlatformExceptions};
use crate::settings::{AxumSettings, MultipartSettings, StaticsOptions};

impl<S: Clone + Send + Sync + 'static> PlatformAxum<S> {
    /// Create a platform served by axum.
    pub fn create(settings: AxumSettings, injector: Injector<MethodRouter<S>>) -> Platform<Self> {
        Platform::new(Self::new(settings), injector)
    }

    /// Layer capping the size of request bodies.
    pub fn body_parser(limit: usize) -> DefaultBodyLimit {
        DefaultBodyLimit::max(limit)
    }

    /// Layer handing multipart limits to the [`MultipartForm`](crate::MultipartForm) extractor.
    pub fn multipart_parser(settings: MultipartSettings) -> Extension<MultipartSettings> {
        Extension(settings)
    }

    pub fn statics(options: &StaticsOptions) -> ServeDir {
        ServeDir::new(&options.root).append_index_html_on_directories(options.index)
    }

    /// Build the request listener.
    ///
    /// Routes mounted on the platform are served first, then the static
    /// directories. Every request goes through the context middleware, which
    /// uses the `Arc<dyn ExceptionHandler>` found in the injector, or
    /// [`PlatformExceptions`].
    pub fn build(platform: Platform<Self>, state: S) -> Router {
        platform.log_routes();

        let exceptions: Arc<dyn ExceptionHandler> = platform
            .injector()
            .get::<Arc<dyn ExceptionHandler>>()
            .unwrap_or_else(|| Arc::new(PlatformExceptions));

        let (adapter, app, _injector) = platform.into_parts();
        let settings = adapter.settings;
        let mut router = app.into_router().with_state(state);

        let mut root_static = false;
        for options in &settings.statics {
            debug!(endpoint = %options.endpoint, root = %options.root.display(), "Serving static files");
            let endpoint = options.endpoint.trim_end_matches('/');
            if endpoint.is_empty() {
                root_static = true;
                router = router.fallback_service(Self::statics(options));
            } else {
                router = router.nest_service(endpoint, Self::statics(options));
            }
        }

        if !settings.strict && !root_static {
            router = with_trailing_slash_fallback(router);
        }

        router
            .layer(Self::multipart_parser(settings.multipart))
            .layer(Self::body_parser(settings.body_limit))
            .layer(axum::middleware::from_fn_with_state(
                exceptions,
                context_middleware,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `settings.address` and serve until Ctrl-C or SIGTERM.
    pub async fn listen(platform: Platform<Self>, state: S) -> Result<(), PlatformError> {
        let address = platform.adapter().settings().address.clone();
        let app = Self::build(platform, state);

        let listener = tokio::net::TcpListener::bind(&address).await?;
        info!(%address, "Trellis server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Trellis server stopped");
        Ok(())
    }
}

/// Retry unmatched `/path/` requests as `/path`.
fn with_trailing_slash_fallback(router: Router) -> Router {
    let inner = router.clone();
    router.fallback(move |req: Request| async move {
        let path = req.uri().path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            let target = match req.uri().query() {
                Some(q) => format!("{trimmed}?{q}"),
                None => trimmed.to_string(),
            };
            let (mut parts, body) = req.into_parts();
            parts.uri = target.parse().unwrap_or(parts.uri);
            match inner.oneshot(Request::from_parts(parts, body)).await {
                Ok(resp) => resp,
                Err(infallible) => match infallible {},
            }
        } else {
            not_found()
        }
    })
}

fn not_found() -> Response {
    axum::http::StatusCode::NOT_FOUND.into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(%err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
