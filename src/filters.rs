//! # Filter Chips
//!
//! The list views narrow records with removable "chips". Each chip names a
//! field and one or more accepted values:
//!
//! - values inside a chip are alternatives (OR)
//! - separate chips must all match (AND)
//! - status chips compare against the *effective* status, so an old
//!   `Ready` notification matches `Expired`, not `Ready`
//! - date-range chips test the record's creation/request time with
//!   [`matches_date_range`]

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{
    effective_notification_status, effective_recommendation_status, matches_date_range,
    DateRangeKeyword,
};
use crate::error::{AppError, AppResult};
use crate::models::{EmailNotification, EntityType, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Status,
    EntityType,
    Publisher,
    Client,
    DateRange,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Status => "Status",
            FilterKind::EntityType => "Entity type",
            FilterKind::Publisher => "Publisher",
            FilterKind::Client => "Client",
            FilterKind::DateRange => "Date range",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            FilterKind::Status => "status",
            FilterKind::EntityType => "entityType",
            FilterKind::Publisher => "publisher",
            FilterKind::Client => "client",
            FilterKind::DateRange => "dateRange",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChip {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub label: String,
    pub values: Vec<String>,
    pub display_text: String,
}

impl FilterChip {
    pub fn new(kind: FilterKind, values: Vec<String>) -> Self {
        Self {
            id: format!("{}-{}", kind.slug(), values.join("|")),
            kind,
            label: kind.label().to_string(),
            display_text: format!("{}: {}", kind.label(), values.join(", ")),
            values,
        }
    }
}

/// Field access shared by the record types the list views filter.
pub trait Filterable {
    fn status_label(&self, now: DateTime<Utc>) -> &'static str;
    fn entity_type(&self) -> EntityType;
    fn publisher_id(&self) -> &str;
    fn publisher_name(&self) -> &str;
    fn client_name(&self) -> Option<&str>;
    /// Timestamp date-range chips are evaluated against.
    fn reference_time(&self) -> DateTime<Utc>;
    fn search_fields(&self) -> Vec<&str>;
}

impl Filterable for EmailNotification {
    fn status_label(&self, now: DateTime<Utc>) -> &'static str {
        effective_notification_status(self, now).as_str()
    }

    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    fn publisher_name(&self) -> &str {
        &self.publisher_name
    }

    fn client_name(&self) -> Option<&str> {
        Some(&self.client_name)
    }

    fn reference_time(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.entity_name.as_str(),
            self.client_name.as_str(),
            self.publisher_name.as_str(),
            self.subject.as_str(),
        ]
    }
}

impl Filterable for Recommendation {
    fn status_label(&self, now: DateTime<Utc>) -> &'static str {
        effective_recommendation_status(self, now).as_str()
    }

    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    fn publisher_name(&self) -> &str {
        &self.publisher_name
    }

    fn client_name(&self) -> Option<&str> {
        None
    }

    fn reference_time(&self) -> DateTime<Utc> {
        self.requested_at
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.entity_name.as_str(),
            self.publisher_name.as_str(),
            self.level.as_str(),
        ]
    }
}

fn any_value_eq(values: &[String], candidate: &str) -> bool {
    values.iter().any(|v| v.trim().eq_ignore_ascii_case(candidate))
}

pub fn chip_matches<T: Filterable>(chip: &FilterChip, record: &T, now: &DateTime<FixedOffset>) -> bool {
    let now_utc = now.with_timezone(&Utc);
    match chip.kind {
        FilterKind::Status => any_value_eq(&chip.values, record.status_label(now_utc)),
        FilterKind::EntityType => any_value_eq(&chip.values, record.entity_type().as_str()),
        FilterKind::Publisher => {
            any_value_eq(&chip.values, record.publisher_id())
                || any_value_eq(&chip.values, record.publisher_name())
        }
        FilterKind::Client => record
            .client_name()
            .is_some_and(|name| any_value_eq(&chip.values, name)),
        FilterKind::DateRange => chip
            .values
            .iter()
            .filter_map(|v| v.parse::<DateRangeKeyword>().ok())
            .any(|keyword| matches_date_range(record.reference_time(), keyword, now)),
    }
}

/// Case-insensitive substring match over the record's display fields.
pub fn search_matches<T: Filterable>(record: &T, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
}

pub fn matches_all<T: Filterable>(
    chips: &[FilterChip],
    search: Option<&str>,
    record: &T,
    now: &DateTime<FixedOffset>,
) -> bool {
    chips.iter().all(|chip| chip_matches(chip, record, now))
        && search.map_or(true, |s| search_matches(record, s))
}

/// Query parameters shared by the list endpoints. Multi-valued filters are
/// comma separated, e.g. `?status=Ready,Sent&dateRange=this-week`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub entity_type: Option<String>,
    pub publisher: Option<String>,
    pub client: Option<String>,
    pub date_range: Option<String>,
    pub search: Option<String>,
    /// Viewer's UTC offset in minutes east, used for calendar boundaries.
    pub tz_offset: Option<i32>,
}

fn split_values(raw: &Option<String>) -> Option<Vec<String>> {
    let values: Vec<String> = raw
        .as_deref()?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (!values.is_empty()).then_some(values)
}

impl ListQuery {
    pub fn chips(&self) -> AppResult<Vec<FilterChip>> {
        let mut chips = Vec::new();

        if let Some(values) = split_values(&self.date_range) {
            if let Some(bad) = values.iter().find(|v| v.parse::<DateRangeKeyword>().is_err()) {
                return Err(AppError::Validation(format!("unknown date range '{}'", bad)));
            }
            chips.push(FilterChip::new(FilterKind::DateRange, values));
        }

        let simple = [
            (FilterKind::Status, &self.status),
            (FilterKind::EntityType, &self.entity_type),
            (FilterKind::Publisher, &self.publisher),
            (FilterKind::Client, &self.client),
        ];
        for (kind, raw) in simple {
            if let Some(values) = split_values(raw) {
                chips.push(FilterChip::new(kind, values));
            }
        }

        Ok(chips)
    }

    /// Current time in the viewer's offset, or the server's local offset
    /// when none was given.
    pub fn now(&self) -> AppResult<DateTime<FixedOffset>> {
        let now = Utc::now();
        let offset = match self.tz_offset {
            Some(minutes) => FixedOffset::east_opt(minutes * 60)
                .ok_or_else(|| AppError::Validation(format!("invalid tzOffset {}", minutes)))?,
            None => *chrono::Local::now().offset(),
        };
        Ok(now.with_timezone(&offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-14T12:00:00+00:00").unwrap()
    }

    fn notification(id: &str, status: &str, days_old: i64, client: &str) -> EmailNotification {
        let created_at = now().with_timezone(&Utc) - Duration::days(days_old);
        serde_json::from_value(json!({
            "id": id,
            "entityId": "c1",
            "entityName": "Spring Hiring",
            "entityType": "Campaign",
            "clientName": client,
            "publisherId": "pub2",
            "publisherName": "ZipRecruiter",
            "subject": "New campaign for your review",
            "recipients": [],
            "status": status,
            "triggerType": "Automatic",
            "createdAt": created_at
        }))
        .unwrap()
    }

    #[test]
    fn chip_display_text_lists_values() {
        let chip = FilterChip::new(FilterKind::Status, vec!["Ready".into(), "Sent".into()]);
        assert_eq!(chip.id, "status-Ready|Sent");
        assert_eq!(chip.display_text, "Status: Ready, Sent");
        assert_eq!(chip.label, "Status");
    }

    #[test]
    fn status_chip_uses_effective_status() {
        let stale = notification("n1", "Ready", 8, "Acme");
        let ready = FilterChip::new(FilterKind::Status, vec!["ready".into()]);
        let expired = FilterChip::new(FilterKind::Status, vec!["Expired".into()]);

        assert!(!chip_matches(&ready, &stale, &now()));
        assert!(chip_matches(&expired, &stale, &now()));
    }

    #[test]
    fn values_or_chips_and() {
        let record = notification("n1", "Sent", 1, "Acme");
        let status = FilterChip::new(FilterKind::Status, vec!["Ready".into(), "Sent".into()]);
        let client = FilterChip::new(FilterKind::Client, vec!["Globex".into()]);

        assert!(matches_all(&[status.clone()], None, &record, &now()));
        assert!(!matches_all(&[status, client], None, &record, &now()));
    }

    #[test]
    fn publisher_chip_accepts_id_or_name() {
        let record = notification("n1", "Sent", 1, "Acme");
        let by_id = FilterChip::new(FilterKind::Publisher, vec!["pub2".into()]);
        let by_name = FilterChip::new(FilterKind::Publisher, vec!["ziprecruiter".into()]);
        assert!(chip_matches(&by_id, &record, &now()));
        assert!(chip_matches(&by_name, &record, &now()));
    }

    #[test]
    fn date_range_chip_uses_created_at() {
        let today = notification("n1", "Ready", 0, "Acme");
        let old = notification("n2", "Ready", 40, "Acme");
        let chip = FilterChip::new(FilterKind::DateRange, vec!["Last 30 days".into()]);

        assert!(chip_matches(&chip, &today, &now()));
        assert!(!chip_matches(&chip, &old, &now()));
    }

    #[test]
    fn search_is_case_insensitive_over_display_fields() {
        let record = notification("n1", "Ready", 0, "Acme Corp");
        assert!(search_matches(&record, "acme"));
        assert!(search_matches(&record, "SPRING"));
        assert!(search_matches(&record, "  "));
        assert!(!search_matches(&record, "indeed"));
    }

    #[test]
    fn query_builds_chips_and_rejects_unknown_ranges() {
        let query = ListQuery {
            status: Some("Ready, Sent".into()),
            date_range: Some("this-week".into()),
            client: Some(" ".into()),
            ..Default::default()
        };
        let chips = query.chips().unwrap();
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].kind, FilterKind::DateRange);
        assert_eq!(chips[1].values, vec!["Ready", "Sent"]);

        let bad = ListQuery {
            date_range: Some("next year".into()),
            ..Default::default()
        };
        assert!(matches!(bad.chips(), Err(AppError::Validation(_))));
    }

    #[test]
    fn query_now_honours_offset() {
        let query = ListQuery {
            tz_offset: Some(-300),
            ..Default::default()
        };
        assert_eq!(query.now().unwrap().offset().local_minus_utc(), -300 * 60);

        let invalid = ListQuery {
            tz_offset: Some(100_000),
            ..Default::default()
        };
        assert!(invalid.now().is_err());
    }
}
