//! # Publisher Outreach Service Library
//!
//! Exposes the Axum router and modules so integration tests can create
//! an in-process server without binding a socket.

pub mod allocator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod outreach;
pub mod preferences;
pub mod routes;
pub mod state;
pub mod store;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// The caller is responsible for loading the store and choosing the
/// preference backend. This function does NOT start a server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_router())
        .merge(routes::notifications::router())
        .merge(routes::reminders::router())
        .merge(routes::recommendations::router())
        .merge(routes::allocations::router())
        .merge(routes::preferences::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
