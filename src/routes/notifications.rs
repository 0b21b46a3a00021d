//! Notification email routes.
//!
//! GET  /notifications          - List notifications with their effective status
//! POST /notifications/:id/send - Send a notification to its publisher

use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::classifier::effective_notification_status;
use crate::error::AppResult;
use crate::filters::{matches_all, ListQuery};
use crate::models::{ApiResponse, NotificationView};
use crate::outreach;
use crate::state::AppState;

/// Build the notifications router.
pub fn router() -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/send", post(send_notification))
}

/// List notifications matching the query's filter chips, newest first.
async fn list_notifications(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<NotificationView>>>> {
    let chips = query.chips()?;
    let now = query.now()?;
    let now_utc = now.with_timezone(&Utc);

    let store = state.store.read().await;
    let mut views: Vec<NotificationView> = store
        .notifications
        .iter()
        .filter(|n| matches_all(&chips, query.search.as_deref(), *n, &now))
        .map(|n| NotificationView {
            effective_status: effective_notification_status(n, now_utc),
            notification: n.clone(),
        })
        .collect();
    views.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));

    let message = format!("{} notifications", views.len());
    Ok(Json(ApiResponse::new(views, message)))
}

/// Send a notification email.
async fn send_notification(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<NotificationView>>> {
    let now = Utc::now();
    let notification = outreach::send_notification(&state, &id, now)
        .await
        .map_err(|e| {
            error!("Failed to send notification {}: {}", id, e);
            e
        })?;

    info!("Notification {} delivered via API", id);

    Ok(Json(ApiResponse::new(
        NotificationView {
            effective_status: effective_notification_status(&notification, now),
            notification,
        },
        "Email sent successfully",
    )))
}
