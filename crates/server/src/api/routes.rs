use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, interactions, middleware as api_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Signed platform callbacks
    let interaction_routes = Router::new()
        .route("/interactions", post(interactions::handle_interaction))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            api_middleware::verify_signature,
        ));

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config));

    Router::new()
        .merge(interaction_routes)
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(api_middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
