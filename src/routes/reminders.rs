//! Follow-up reminder routes.
//!
//! GET  /reminders          - Sent notifications that are due or overdue
//! POST /reminders/:id/send - Send a follow-up for one notification

use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use crate::classifier::{reminder_for, ReminderBucket};
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, ReminderView};
use crate::outreach;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReminderQuery {
    pub bucket: Option<String>,
}

/// Build the reminders router.
pub fn router() -> Router {
    Router::new()
        .route("/reminders", get(list_reminders))
        .route("/reminders/{id}/send", post(send_reminder))
}

/// List reminder-eligible notifications, longest-waiting first.
async fn list_reminders(
    Extension(state): Extension<AppState>,
    Query(query): Query<ReminderQuery>,
) -> AppResult<Json<ApiResponse<Vec<ReminderView>>>> {
    let bucket = query
        .bucket
        .as_deref()
        .map(str::parse::<ReminderBucket>)
        .transpose()
        .map_err(AppError::Validation)?;
    let now = Utc::now();

    let store = state.store.read().await;
    let mut views: Vec<ReminderView> = store
        .notifications
        .iter()
        .filter_map(|n| reminder_for(n, now).map(|r| (n, r)))
        .filter(|(_, r)| bucket.map_or(true, |b| r.bucket == b))
        .map(|(n, r)| ReminderView {
            notification: n.clone(),
            bucket: r.bucket,
            reminder_count: r.reminder_count,
            hours_since_sent: r.hours_since_sent,
        })
        .collect();
    views.sort_by(|a, b| b.hours_since_sent.cmp(&a.hours_since_sent));

    let overdue = views
        .iter()
        .filter(|v| v.bucket == ReminderBucket::Overdue)
        .count();
    let message = format!("{} reminders ({} overdue)", views.len(), overdue);
    Ok(Json(ApiResponse::new(views, message)))
}

/// Send a follow-up reminder.
async fn send_reminder(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ReminderView>>> {
    let (notification, reminder) = outreach::send_reminder(&state, &id, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to send reminder for {}: {}", id, e);
            e
        })?;

    Ok(Json(ApiResponse::new(
        ReminderView {
            notification,
            bucket: reminder.bucket,
            reminder_count: reminder.reminder_count,
            hours_since_sent: reminder.hours_since_sent,
        },
        "Reminder sent successfully",
    )))
}
