//! Web application router and middleware setup.

use crate::web::handlers;
use crate::web::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main axum application with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let mut app = Router::new()
        .route("/", get(handlers::status_page))
        .route("/api/latest", get(handlers::get_latest))
        .route("/api/health", get(handlers::health_check))
        .with_state(state);

    // Phone dashboards on the LAN poll the API cross-origin
    if enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
