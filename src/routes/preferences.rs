//! User preference routes.
//!
//! GET /preferences - Saved selection, reconciled with available instances
//! PUT /preferences - Replace and persist the selection

use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::ApiResponse;
use crate::preferences::{resolve, validate, UserPreferences};
use crate::state::AppState;

/// Build the preferences router.
pub fn router() -> Router {
    Router::new().route("/preferences", get(get_preferences).put(update_preferences))
}

async fn get_preferences(
    Extension(state): Extension<AppState>,
) -> Json<ApiResponse<UserPreferences>> {
    let saved = state.preferences.load().await;
    let resolved = resolve(&saved, &*state.store.read().await);
    Json(ApiResponse::new(resolved, "Preferences retrieved"))
}

async fn update_preferences(
    Extension(state): Extension<AppState>,
    Json(preferences): Json<UserPreferences>,
) -> AppResult<Json<ApiResponse<UserPreferences>>> {
    validate(&preferences, &*state.store.read().await)?;

    state.preferences.save(&preferences).await.map_err(|e| {
        error!("Failed to save preferences: {}", e);
        e
    })?;

    info!(
        "Preferences updated: instance={:?}, {} clients selected",
        preferences.selected_instance_id,
        preferences.selected_client_ids.len()
    );

    Ok(Json(ApiResponse::new(preferences, "Preferences saved")))
}
