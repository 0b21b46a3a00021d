//! Per-publisher allocation routes.
//!
//! POST /allocations                              - Allocate arbitrary metrics
//! GET  /entities/:entity_type/:id/allocations    - Allocate a stored entity's metrics

use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use crate::allocator::allocate_all;
use crate::error::{AppError, AppResult};
use crate::models::{AllocationRequest, ApiResponse, EntityType, PublisherMetrics};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAllocationQuery {
    /// Comma-separated publisher ids; every known publisher when absent.
    pub publisher_ids: Option<String>,
}

/// Build the allocations router.
pub fn router() -> Router {
    Router::new()
        .route("/allocations", post(allocate_metrics))
        .route(
            "/entities/{entity_type}/{id}/allocations",
            get(allocate_entity),
        )
}

async fn allocate_metrics(
    Json(req): Json<AllocationRequest>,
) -> Json<ApiResponse<Vec<PublisherMetrics>>> {
    let allocations = allocate_all(
        req.entity_metrics.as_ref(),
        &req.publisher_ids,
        req.overrides.as_ref(),
    );
    let message = format!("{} allocations", allocations.len());
    Json(ApiResponse::new(allocations, message))
}

async fn allocate_entity(
    Extension(state): Extension<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
    Query(query): Query<EntityAllocationQuery>,
) -> AppResult<Json<ApiResponse<Vec<PublisherMetrics>>>> {
    let entity_type = EntityType::from_path_segment(&entity_type)
        .ok_or_else(|| AppError::Validation(format!("unknown entity type '{}'", entity_type)))?;

    let store = state.store.read().await;
    let entity = store.entity(entity_type, &id)?;

    let publisher_ids: Vec<String> = match query.publisher_ids.as_deref() {
        Some(raw) => {
            let ids: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            for publisher_id in &ids {
                store.publisher(publisher_id)?;
            }
            ids
        }
        None => store.publishers.iter().map(|p| p.id.clone()).collect(),
    };

    let allocations = allocate_all(entity.metrics.as_ref(), &publisher_ids, None);
    let message = format!("Allocations for {} {}", entity_type.as_str(), entity.name);
    Ok(Json(ApiResponse::new(allocations, message)))
}
