//! HTTP route modules for the publisher outreach service.
//!
//! - `notifications`: notification emails and their effective status
//! - `reminders`: follow-ups on sent notifications
//! - `recommendations`: bid/budget recommendation requests and reviews
//! - `allocations`: per-publisher metric splits
//! - `preferences`: saved instance/client selection

pub mod allocations;
pub mod notifications;
pub mod preferences;
pub mod recommendations;
pub mod reminders;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Build the health router.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
