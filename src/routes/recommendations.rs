//! Recommendation routes.
//!
//! GET  /recommendations              - List recommendations with effective status
//! POST /recommendations              - Request a recommendation from a publisher
//! GET  /recommendations/:id          - Retrieve one recommendation
//! POST /recommendations/:id/response - Record the publisher's proposed values
//! POST /recommendations/:id/review   - Accept or reject proposed values

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use tracing::error;

use crate::classifier::{effective_recommendation_status, recommendation_expiring_soon};
use crate::error::AppResult;
use crate::filters::{matches_all, ListQuery};
use crate::models::{
    ApiResponse, CreateRecommendationRequest, Recommendation, RecommendationView,
    RecordResponseRequest, ReviewRecommendationRequest,
};
use crate::outreach;
use crate::state::AppState;

/// Build the recommendations router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/recommendations",
            get(list_recommendations).post(create_recommendation),
        )
        .route("/recommendations/{id}", get(get_recommendation))
        .route("/recommendations/{id}/response", post(record_response))
        .route("/recommendations/{id}/review", post(review_recommendation))
}

fn view(recommendation: Recommendation, now: DateTime<Utc>) -> RecommendationView {
    RecommendationView {
        effective_status: effective_recommendation_status(&recommendation, now),
        expiring_soon: recommendation_expiring_soon(&recommendation, now),
        recommendation,
    }
}

/// List recommendations matching the query's filter chips, newest first.
async fn list_recommendations(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<RecommendationView>>>> {
    let chips = query.chips()?;
    let now = query.now()?;
    let now_utc = now.with_timezone(&Utc);

    let store = state.store.read().await;
    let mut views: Vec<RecommendationView> = store
        .recommendations
        .iter()
        .filter(|r| matches_all(&chips, query.search.as_deref(), *r, &now))
        .map(|r| view(r.clone(), now_utc))
        .collect();
    views.sort_by(|a, b| b.recommendation.requested_at.cmp(&a.recommendation.requested_at));

    let expiring = views.iter().filter(|v| v.expiring_soon).count();
    let message = format!("{} recommendations ({} expiring soon)", views.len(), expiring);
    Ok(Json(ApiResponse::new(views, message)))
}

/// Request a new recommendation.
async fn create_recommendation(
    Extension(state): Extension<AppState>,
    Json(req): Json<CreateRecommendationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecommendationView>>)> {
    let now = Utc::now();
    let recommendation = outreach::request_recommendation(&state, req, now)
        .await
        .map_err(|e| {
            error!("Failed to request recommendation: {}", e);
            e
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            view(recommendation, now),
            "Recommendation requested successfully",
        )),
    ))
}

/// Retrieve a recommendation by ID.
async fn get_recommendation(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<RecommendationView>>> {
    let recommendation = state.store.read().await.recommendation(&id)?.clone();
    Ok(Json(ApiResponse::new(
        view(recommendation, Utc::now()),
        "Recommendation retrieved",
    )))
}

async fn record_response(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RecordResponseRequest>,
) -> AppResult<Json<ApiResponse<RecommendationView>>> {
    let now = Utc::now();
    let recommendation = outreach::record_response(&state, &id, req, now).await?;
    Ok(Json(ApiResponse::new(
        view(recommendation, now),
        "Response recorded",
    )))
}

async fn review_recommendation(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRecommendationRequest>,
) -> AppResult<Json<ApiResponse<RecommendationView>>> {
    let now = Utc::now();
    let recommendation = outreach::review_recommendation(&state, &id, req, now).await?;
    let message = format!("Recommendation {}", recommendation.status.as_str().to_lowercase());
    Ok(Json(ApiResponse::new(view(recommendation, now), message)))
}
