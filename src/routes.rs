use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::panic_response;
use crate::handlers;
use crate::AppState;

/// Create file server routes
pub fn file_routes(max_upload_size: u64) -> Router<AppState> {
    let upload_limit = usize::try_from(max_upload_size).unwrap_or(usize::MAX);

    Router::new()
        // Browse
        .route("/local", get(handlers::browse))
        .route("/local/", get(handlers::browse))
        .route("/local/{*subpath}", get(handlers::browse))
        // Forced download
        .route("/download", get(handlers::download))
        .route("/download/", get(handlers::download))
        .route("/download/{*subpath}", get(handlers::download))
        // Upload form and receiver
        .route(
            "/upload",
            get(handlers::upload_form)
                .post(handlers::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/upload/",
            get(handlers::upload_form)
                .post(handlers::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Listing icons
        .route("/images/{name}", get(handlers::image))
}

/// Build the complete application: routes, state and the request layers.
///
/// Handler errors become 500 responses through `FileServerError`'s
/// `IntoResponse`; panics are caught here and answered the same way.
pub fn app(state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;

    Router::new()
        .merge(file_routes(max_upload_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}
