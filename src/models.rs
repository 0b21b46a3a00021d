//! Domain models for the publisher outreach service.
//!
//! These structs mirror the JSON records the dashboard works with. The
//! store holds them as-is; derived labels (effective status, reminder
//! bucket, expiring-soon) are computed at read time and only appear in
//! the response models below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Client,
    Campaign,
    JobGroup,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Client => "Client",
            EntityType::Campaign => "Campaign",
            EntityType::JobGroup => "JobGroup",
        }
    }

    /// Parses the path segment form used by the entity routes.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "client" | "clients" => Some(EntityType::Client),
            "campaign" | "campaigns" => Some(EntityType::Campaign),
            "jobgroup" | "jobgroups" | "job-group" | "job-groups" => Some(EntityType::JobGroup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationStatus {
    Processing,
    Ready,
    Sent,
    Failed,
    Expired,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Processing => "Processing",
            NotificationStatus::Ready => "Ready",
            NotificationStatus::Sent => "Sent",
            NotificationStatus::Failed => "Failed",
            NotificationStatus::Expired => "Expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    Manual,
    Automatic,
}

/// Lifecycle of a recommendation request. This is the single canonical set
/// of values accepted on input and produced on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationStatus {
    Pending,
    Sent,
    #[serde(rename = "Response Received")]
    ResponseReceived,
    Accepted,
    #[serde(rename = "Partially accepted")]
    PartiallyAccepted,
    Rejected,
    Expired,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "Pending",
            RecommendationStatus::Sent => "Sent",
            RecommendationStatus::ResponseReceived => "Response Received",
            RecommendationStatus::Accepted => "Accepted",
            RecommendationStatus::PartiallyAccepted => "Partially accepted",
            RecommendationStatus::Rejected => "Rejected",
            RecommendationStatus::Expired => "Expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    #[serde(rename = "CPC Bid")]
    CpcBid,
    #[serde(rename = "CPA Goal")]
    CpaGoal,
    Budget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceStatus {
    Accepted,
    Rejected,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublisherType {
    #[serde(rename = "CPC")]
    Cpc,
    #[serde(rename = "CPA")]
    Cpa,
    #[serde(rename = "TCPA")]
    Tcpa,
    #[serde(rename = "Flat CPC")]
    FlatCpc,
    #[serde(rename = "Flat CPA")]
    FlatCpa,
}

impl PublisherType {
    /// Whether the publisher bids on cost per click (as opposed to cost per
    /// acquisition).
    pub fn is_click_based(&self) -> bool {
        matches!(self, PublisherType::Cpc | PublisherType::FlatCpc)
    }
}

// ============================================================================
// Stored records
// ============================================================================

/// Aggregate figures attached to a Client, Campaign or JobGroup before
/// they are split across publishers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetrics {
    pub budget: f64,
    pub cpc_bid: f64,
    pub cpa_goal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub publisher_type: PublisherType,
    pub email: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub instance_id: String,
    #[serde(default)]
    pub metrics: Option<EntityMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub client_id: String,
    #[serde(default)]
    pub metrics: Option<EntityMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobGroup {
    pub id: String,
    pub name: String,
    pub campaign_id: String,
    #[serde(default)]
    pub metrics: Option<EntityMetrics>,
}

/// An outreach email announcing a new entity to a publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotification {
    pub id: String,
    pub entity_id: String,
    pub entity_name: String,
    pub entity_type: EntityType,
    pub client_name: String,
    pub publisher_id: String,
    pub publisher_name: String,
    pub subject: String,
    pub recipients: Vec<String>,
    pub status: NotificationStatus,
    pub trigger_type: TriggerType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_reminded_at: Option<DateTime<Utc>>,
    /// Rendered template payload, passed through untouched.
    #[serde(default)]
    pub template: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMetric {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub current_value: f64,
    #[serde(default)]
    pub recommended_value: Option<f64>,
    pub is_mandatory: bool,
    #[serde(default)]
    pub acceptance_status: Option<AcceptanceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub entity_id: String,
    pub entity_name: String,
    pub entity_type: EntityType,
    pub publisher_id: String,
    pub publisher_name: String,
    pub level: String,
    pub status: RecommendationStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub metrics: Vec<RecommendationMetric>,
}

// ============================================================================
// Request Models (Deserialize from JSON input)
// ============================================================================

/// Request body for the allocation endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    #[serde(default)]
    pub entity_metrics: Option<EntityMetrics>,
    #[serde(default)]
    pub publisher_ids: Vec<String>,
    /// Values typed directly into the form when no publisher is selected.
    #[serde(default)]
    pub overrides: Option<EntityMetrics>,
}

/// Request body for opening a new recommendation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub publisher_id: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// A publisher's proposed value for one metric.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponseInput {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub recommended_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponseRequest {
    pub metrics: Vec<MetricResponseInput>,
}

/// The reviewer's decision on one metric.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDecisionInput {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub acceptance_status: AcceptanceStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecommendationRequest {
    pub decisions: Vec<MetricDecisionInput>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

/// A notification together with the status the dashboard should display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: EmailNotification,
    pub effective_status: NotificationStatus,
}

/// A sent notification that is due for a follow-up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderView {
    #[serde(flatten)]
    pub notification: EmailNotification,
    pub bucket: crate::classifier::ReminderBucket,
    pub reminder_count: i64,
    pub hours_since_sent: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub effective_status: RecommendationStatus,
    pub expiring_soon: bool,
}

/// Per-publisher share of an entity's aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherMetrics {
    pub publisher_id: Option<String>,
    pub budget: f64,
    pub cpc_bid: f64,
    pub cpa_goal: f64,
}
