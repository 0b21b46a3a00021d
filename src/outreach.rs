//! # Outreach Operations
//!
//! The dashboard's outbound actions. Each one stands in for a call to the
//! mail service or a publisher API: validation happens against the current
//! snapshot, then [`AppState::simulate_network`] waits out the fixed delay,
//! then the change is applied. The simulated calls always succeed.
//!
//! The store lock is never held across the delay, so every precondition
//! is checked again under the write lock before the change is applied. Of
//! two concurrent calls on the same record, the second gets the same error
//! it would have got had it arrived after the first finished.
//!
//! ## Recommendation lifecycle
//!
//! 1. **request**: `Pending`, metrics seeded from the publisher's allocation
//! 2. **publisher response**: `Response Received`, recommended values filled in
//! 3. **review**: `Accepted`, `Rejected` or `Partially accepted`

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::allocator::allocate;
use crate::classifier::{
    effective_notification_status, effective_recommendation_status, reminder_for, Reminder,
    EXPIRY_WINDOW_MS,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AcceptanceStatus, CreateRecommendationRequest, EmailNotification, MetricType,
    NotificationStatus, Publisher, Recommendation, RecommendationMetric, RecommendationStatus,
    RecordResponseRequest, ReviewRecommendationRequest,
};
use crate::state::AppState;
use crate::store::{EntityRef, Store};

fn short_id(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().to_string().replace('-', "")[..8])
}

// ============================================================================
// Notifications
// ============================================================================

fn check_sendable(notification: &EmailNotification, now: DateTime<Utc>) -> AppResult<()> {
    match effective_notification_status(notification, now) {
        NotificationStatus::Sent => {
            return Err(AppError::Conflict(format!(
                "notification {} was already sent",
                notification.id
            )));
        }
        NotificationStatus::Expired => {
            return Err(AppError::Validation(format!(
                "notification {} expired and can no longer be sent",
                notification.id
            )));
        }
        NotificationStatus::Processing | NotificationStatus::Ready | NotificationStatus::Failed => {}
    }
    if notification.recipients.is_empty() {
        return Err(AppError::Validation(format!(
            "notification {} has no recipients",
            notification.id
        )));
    }
    Ok(())
}

/// Delivers a notification email to its publisher recipients.
pub async fn send_notification(
    state: &AppState,
    id: &str,
    now: DateTime<Utc>,
) -> AppResult<EmailNotification> {
    {
        let store = state.store.read().await;
        check_sendable(store.notification(id)?, now)?;
    }

    state.simulate_network().await;

    let mut store = state.store.write().await;
    let notification = store.notification_mut(id)?;
    // A concurrent send may have finished during the delay.
    check_sendable(notification, now)?;
    notification.status = NotificationStatus::Sent;
    notification.sent_at = Some(now);

    info!(
        "Notification {} sent to {} ({} recipients)",
        id,
        notification.publisher_name,
        notification.recipients.len()
    );

    Ok(notification.clone())
}

/// Sends a follow-up for a notification that is due or overdue.
pub async fn send_reminder(
    state: &AppState,
    id: &str,
    now: DateTime<Utc>,
) -> AppResult<(EmailNotification, Reminder)> {
    let reminder = {
        let store = state.store.read().await;
        let notification = store.notification(id)?;
        reminder_for(notification, now).ok_or_else(|| {
            AppError::Validation(format!("notification {} is not due for a reminder", id))
        })?
    };

    state.simulate_network().await;

    let mut store = state.store.write().await;
    let notification = store.notification_mut(id)?;
    notification.last_reminded_at = Some(now);

    info!(
        "Reminder sent for notification {} to {}: {:?}, {} hours since send",
        id, notification.publisher_name, reminder.bucket, reminder.hours_since_sent
    );

    Ok((notification.clone(), reminder))
}

// ============================================================================
// Recommendations
// ============================================================================

fn is_open(status: RecommendationStatus) -> bool {
    matches!(
        status,
        RecommendationStatus::Pending | RecommendationStatus::Sent | RecommendationStatus::ResponseReceived
    )
}

fn check_no_open_request(
    store: &Store,
    entity: &EntityRef,
    publisher: &Publisher,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let duplicate = store.recommendations.iter().any(|r| {
        r.entity_id == entity.id
            && r.publisher_id == publisher.id
            && is_open(effective_recommendation_status(r, now))
    });
    if duplicate {
        return Err(AppError::Conflict(format!(
            "an open recommendation already exists for {} with {}",
            entity.name, publisher.name
        )));
    }
    Ok(())
}

/// Asks a publisher for bid/budget recommendations on an entity.
pub async fn request_recommendation(
    state: &AppState,
    req: CreateRecommendationRequest,
    now: DateTime<Utc>,
) -> AppResult<Recommendation> {
    let (entity, publisher) = {
        let store = state.store.read().await;
        let entity = store.entity(req.entity_type, &req.entity_id)?;
        let publisher = store.publisher(&req.publisher_id)?.clone();
        check_no_open_request(&store, &entity, &publisher, now)?;
        (entity, publisher)
    };

    let allocation = allocate(entity.metrics.as_ref(), &publisher.id);
    let mut metrics = Vec::with_capacity(2);
    if publisher.publisher_type.is_click_based() {
        metrics.push(RecommendationMetric {
            metric_type: MetricType::CpcBid,
            current_value: allocation.cpc_bid,
            recommended_value: None,
            is_mandatory: false,
            acceptance_status: None,
        });
    } else {
        metrics.push(RecommendationMetric {
            metric_type: MetricType::CpaGoal,
            current_value: allocation.cpa_goal,
            recommended_value: None,
            is_mandatory: false,
            acceptance_status: None,
        });
    }
    metrics.push(RecommendationMetric {
        metric_type: MetricType::Budget,
        current_value: allocation.budget,
        recommended_value: None,
        is_mandatory: true,
        acceptance_status: None,
    });

    state.simulate_network().await;

    let mut store = state.store.write().await;
    // Another request for the same pair may have landed during the delay.
    check_no_open_request(&store, &entity, &publisher, now)?;

    let recommendation = Recommendation {
        id: short_id("rec"),
        level: req.level.unwrap_or_else(|| entity.entity_type.as_str().to_string()),
        entity_id: entity.id,
        entity_name: entity.name,
        entity_type: entity.entity_type,
        publisher_id: publisher.id,
        publisher_name: publisher.name,
        status: RecommendationStatus::Pending,
        requested_at: now,
        responded_at: None,
        expires_at: Some(now + Duration::milliseconds(EXPIRY_WINDOW_MS)),
        metrics,
    };

    info!(
        "Recommendation {} requested from {} for {} {}",
        recommendation.id,
        recommendation.publisher_name,
        recommendation.entity_type.as_str(),
        recommendation.entity_name
    );

    store.recommendations.push(recommendation.clone());
    Ok(recommendation)
}

fn check_respondable(
    recommendation: &Recommendation,
    req: &RecordResponseRequest,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let id = &recommendation.id;
    match effective_recommendation_status(recommendation, now) {
        RecommendationStatus::Pending | RecommendationStatus::Sent => {}
        RecommendationStatus::Expired => {
            return Err(AppError::Validation(format!("recommendation {} has expired", id)));
        }
        other => {
            return Err(AppError::Conflict(format!(
                "recommendation {} is already '{}'",
                id,
                other.as_str()
            )));
        }
    }
    if req.metrics.is_empty() {
        return Err(AppError::Validation("response contains no metrics".to_string()));
    }
    if let Some(unknown) = req
        .metrics
        .iter()
        .find(|m| !recommendation.metrics.iter().any(|own| own.metric_type == m.metric_type))
    {
        return Err(AppError::Validation(format!(
            "recommendation {} does not track {:?}",
            id, unknown.metric_type
        )));
    }
    Ok(())
}

/// Records the values a publisher proposed in reply to a request.
pub async fn record_response(
    state: &AppState,
    id: &str,
    req: RecordResponseRequest,
    now: DateTime<Utc>,
) -> AppResult<Recommendation> {
    {
        let store = state.store.read().await;
        check_respondable(store.recommendation(id)?, &req, now)?;
    }

    state.simulate_network().await;

    let mut store = state.store.write().await;
    let recommendation = store.recommendation_mut(id)?;
    check_respondable(recommendation, &req, now)?;
    for input in &req.metrics {
        if let Some(metric) = recommendation
            .metrics
            .iter_mut()
            .find(|m| m.metric_type == input.metric_type)
        {
            metric.recommended_value = Some(input.recommended_value);
            metric.acceptance_status = Some(AcceptanceStatus::Pending);
        }
    }
    recommendation.status = RecommendationStatus::ResponseReceived;
    recommendation.responded_at = Some(now);

    info!(
        "Response recorded for recommendation {} from {}",
        id, recommendation.publisher_name
    );

    Ok(recommendation.clone())
}

/// Status after review: everything accepted or everything rejected gives a
/// clean verdict, any other mix is a partial acceptance.
pub fn review_outcome(metrics: &[RecommendationMetric]) -> RecommendationStatus {
    let proposed: Vec<AcceptanceStatus> = metrics
        .iter()
        .filter(|m| m.recommended_value.is_some())
        .map(|m| m.acceptance_status.unwrap_or(AcceptanceStatus::Pending))
        .collect();

    if !proposed.is_empty() && proposed.iter().all(|s| *s == AcceptanceStatus::Accepted) {
        RecommendationStatus::Accepted
    } else if !proposed.is_empty() && proposed.iter().all(|s| *s == AcceptanceStatus::Rejected) {
        RecommendationStatus::Rejected
    } else {
        RecommendationStatus::PartiallyAccepted
    }
}

/// The recommendation's metrics with `req`'s decisions applied, or the
/// reason the review cannot be saved.
fn reviewed_metrics(
    recommendation: &Recommendation,
    req: &ReviewRecommendationRequest,
    now: DateTime<Utc>,
) -> AppResult<Vec<RecommendationMetric>> {
    let id = &recommendation.id;
    match effective_recommendation_status(recommendation, now) {
        RecommendationStatus::ResponseReceived | RecommendationStatus::PartiallyAccepted => {}
        RecommendationStatus::Expired => {
            return Err(AppError::Validation(format!("recommendation {} has expired", id)));
        }
        other => {
            return Err(AppError::Conflict(format!(
                "recommendation {} cannot be reviewed while '{}'",
                id,
                other.as_str()
            )));
        }
    }

    let mut metrics = recommendation.metrics.clone();
    for decision in &req.decisions {
        let metric = metrics
            .iter_mut()
            .find(|m| m.metric_type == decision.metric_type)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "recommendation {} does not track {:?}",
                    id, decision.metric_type
                ))
            })?;
        if metric.recommended_value.is_none() {
            return Err(AppError::Validation(format!(
                "{:?} has no recommended value to review",
                decision.metric_type
            )));
        }
        metric.acceptance_status = Some(decision.acceptance_status);
    }

    if let Some(undecided) = metrics.iter().find(|m| {
        m.is_mandatory
            && m.recommended_value.is_some()
            && m.acceptance_status.unwrap_or(AcceptanceStatus::Pending) == AcceptanceStatus::Pending
    }) {
        return Err(AppError::Validation(format!(
            "mandatory metric {:?} must be accepted or rejected",
            undecided.metric_type
        )));
    }
    Ok(metrics)
}

/// Applies accept/reject decisions to a responded recommendation.
///
/// Mandatory metrics must end up decided; other metrics may stay pending.
pub async fn review_recommendation(
    state: &AppState,
    id: &str,
    req: ReviewRecommendationRequest,
    now: DateTime<Utc>,
) -> AppResult<Recommendation> {
    {
        let store = state.store.read().await;
        reviewed_metrics(store.recommendation(id)?, &req, now)?;
    }

    state.simulate_network().await;

    let mut store = state.store.write().await;
    let recommendation = store.recommendation_mut(id)?;
    // Decisions land on the metrics as they are now, not as they were
    // before the delay.
    let reviewed = reviewed_metrics(recommendation, &req, now)?;
    recommendation.status = review_outcome(&reviewed);
    recommendation.metrics = reviewed;

    info!(
        "Recommendation {} reviewed: {}",
        id,
        recommendation.status.as_str()
    );

    Ok(recommendation.clone())
}
