//! HTTP API handlers and routing.

pub mod error;
mod health;
pub mod request_context;
pub mod validate;

use axum::Router;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::state::AppState;
use request_context::{request_id_header, MakeRequestUlid};

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .merge(health::routes())
        // Admission reviews
        .merge(validate::routes())
        // Middleware (last added runs first)
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUlid))
        // Application state
        .with_state(state)
}
