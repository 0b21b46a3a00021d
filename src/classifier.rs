//! # Temporal Classifier
//!
//! Pure functions that place notifications and recommendations into
//! time-based buckets relative to a caller-supplied `now`:
//!
//! - **Expiry**: anything older than seven days is shown as `Expired`
//! - **Reminders**: sent notifications become `DueToday` after 24 hours and
//!   `Overdue` after 72 hours
//! - **Expiring soon**: a recommendation whose deadline is at most two days out
//! - **Date ranges**: relative windows (Today, Last week, ...) evaluated at
//!   local midnights of the time zone `now` is expressed in
//!
//! Nothing here reads the clock or mutates its inputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{EmailNotification, NotificationStatus, Recommendation, RecommendationStatus};

/// Seven days, the age after which undelivered notifications and
/// recommendation requests lapse.
pub const EXPIRY_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Hours after sending at which a follow-up becomes due.
const REMINDER_DUE_HOURS: i64 = 24;
/// Hours after sending at which a follow-up is overdue.
const REMINDER_OVERDUE_HOURS: i64 = 72;
const EXPIRING_SOON_DAYS: i64 = 2;

fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    to.timestamp_millis() - from.timestamp_millis()
}

// ============================================================================
// Expiry and reminders
// ============================================================================

/// True once strictly more than seven days have passed since `created_at`.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    elapsed_ms(created_at, now) > EXPIRY_WINDOW_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReminderBucket {
    DueToday,
    Overdue,
}

impl FromStr for ReminderBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_keyword(s).as_str() {
            "duetoday" | "due today" => Ok(ReminderBucket::DueToday),
            "overdue" => Ok(ReminderBucket::Overdue),
            other => Err(format!("unknown reminder bucket '{}'", other)),
        }
    }
}

/// Follow-up state of a sent notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reminder {
    pub bucket: ReminderBucket,
    /// Whole days elapsed since sending.
    pub reminder_count: i64,
    pub hours_since_sent: i64,
}

/// Buckets a sent notification by whole hours since `sent_at`.
///
/// Returns `None` during the first 24 hours (including a `sent_at` in the
/// future).
pub fn classify_reminder(sent_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Reminder> {
    let hours = elapsed_ms(sent_at, now).div_euclid(HOUR_MS);
    if hours < REMINDER_DUE_HOURS {
        return None;
    }

    let bucket = if hours < REMINDER_OVERDUE_HOURS {
        ReminderBucket::DueToday
    } else {
        ReminderBucket::Overdue
    };

    Some(Reminder {
        bucket,
        reminder_count: hours / 24,
        hours_since_sent: hours,
    })
}

/// True when the deadline falls within the next two days, counting any
/// started day as a whole one. Deadlines already passed are not "soon".
pub fn is_expiring_soon(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let remaining = elapsed_ms(now, expires_at);
    let mut days = remaining.div_euclid(DAY_MS);
    if remaining.rem_euclid(DAY_MS) != 0 {
        days += 1;
    }
    days > 0 && days <= EXPIRING_SOON_DAYS
}

// ============================================================================
// Read-time projections
// ============================================================================

/// The status to display for a notification: `Ready` lapses to `Expired`
/// after seven days, every other stored status is shown as-is.
pub fn effective_notification_status(
    notification: &EmailNotification,
    now: DateTime<Utc>,
) -> NotificationStatus {
    if notification.status == NotificationStatus::Ready && is_expired(notification.created_at, now) {
        NotificationStatus::Expired
    } else {
        notification.status
    }
}

/// The status to display for a recommendation. Requests older than seven
/// days show as `Expired` whatever their stored status.
pub fn effective_recommendation_status(
    recommendation: &Recommendation,
    now: DateTime<Utc>,
) -> RecommendationStatus {
    if is_expired(recommendation.requested_at, now) {
        RecommendationStatus::Expired
    } else {
        recommendation.status
    }
}

/// Reminder state for a notification; only sent notifications qualify.
pub fn reminder_for(notification: &EmailNotification, now: DateTime<Utc>) -> Option<Reminder> {
    notification
        .sent_at
        .and_then(|sent_at| classify_reminder(sent_at, now))
}

pub fn recommendation_expiring_soon(recommendation: &Recommendation, now: DateTime<Utc>) -> bool {
    recommendation
        .expires_at
        .is_some_and(|expires_at| is_expiring_soon(expires_at, now))
}

// ============================================================================
// Relative date ranges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRangeKeyword {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Last30Days,
}

impl DateRangeKeyword {
    pub fn label(&self) -> &'static str {
        match self {
            DateRangeKeyword::Today => "Today",
            DateRangeKeyword::Yesterday => "Yesterday",
            DateRangeKeyword::ThisWeek => "This week",
            DateRangeKeyword::LastWeek => "Last week",
            DateRangeKeyword::ThisMonth => "This month",
            DateRangeKeyword::LastMonth => "Last month",
            DateRangeKeyword::Last30Days => "Last 30 days",
        }
    }
}

impl fmt::Display for DateRangeKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercases and folds `-`/`_` to spaces so `last-30-days`, `last_week`
/// and `Last week` all parse.
fn normalize_keyword(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect()
}

impl FromStr for DateRangeKeyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_keyword(s).as_str() {
            "today" => Ok(DateRangeKeyword::Today),
            "yesterday" => Ok(DateRangeKeyword::Yesterday),
            "this week" => Ok(DateRangeKeyword::ThisWeek),
            "last week" => Ok(DateRangeKeyword::LastWeek),
            "this month" => Ok(DateRangeKeyword::ThisMonth),
            "last month" => Ok(DateRangeKeyword::LastMonth),
            "last 30 days" => Ok(DateRangeKeyword::Last30Days),
            other => Err(format!("unknown date range '{}'", other)),
        }
    }
}

/// Inclusive `[start, end]` bounds, with `end` at 23:59:59.999 local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

/// First instant of `date` in `tz`. When a DST transition skips local
/// midnight, the day starts at the first local minute that exists.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..24 * 60).find_map(|minute| {
        let local = midnight + Duration::minutes(minute);
        tz.from_local_datetime(&local)
            .earliest()
            .map(|instant| instant.with_timezone(&Utc))
    })
}

fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(start_of_day(tz, date.succ_opt()?)? - Duration::milliseconds(1))
}

/// Computes the window a keyword denotes relative to `now`, using calendar
/// days in `now`'s time zone. Weeks run Monday through Sunday.
///
/// Returns `None` only at the edges of the representable calendar.
pub fn date_range_window<Tz: TimeZone>(
    keyword: DateRangeKeyword,
    now: &DateTime<Tz>,
) -> Option<DateWindow> {
    let tz = now.timezone();
    let today = now.date_naive();

    let (first, last) = match keyword {
        DateRangeKeyword::Today => (today, today),
        DateRangeKeyword::Yesterday => {
            let yesterday = today.checked_sub_days(Days::new(1))?;
            (yesterday, yesterday)
        }
        DateRangeKeyword::ThisWeek => {
            let monday = week_start(today)?;
            (monday, monday.checked_add_days(Days::new(6))?)
        }
        DateRangeKeyword::LastWeek => {
            let monday = week_start(today)?.checked_sub_days(Days::new(7))?;
            (monday, monday.checked_add_days(Days::new(6))?)
        }
        DateRangeKeyword::ThisMonth => (first_of_month(today)?, last_of_month(today)?),
        DateRangeKeyword::LastMonth => {
            let last_prev = first_of_month(today)?.pred_opt()?;
            (first_of_month(last_prev)?, last_prev)
        }
        DateRangeKeyword::Last30Days => (today.checked_sub_days(Days::new(30))?, today),
    };

    Some(DateWindow {
        start: start_of_day(&tz, first)?,
        end: end_of_day(&tz, last)?,
    })
}

pub fn matches_date_range<Tz: TimeZone>(
    timestamp: DateTime<Utc>,
    keyword: DateRangeKeyword,
    now: &DateTime<Tz>,
) -> bool {
    date_range_window(keyword, now).is_some_and(|window| window.contains(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDateTime};
    use serde_json::json;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn notification(status: NotificationStatus, created_at: DateTime<Utc>) -> EmailNotification {
        serde_json::from_value(json!({
            "id": "n1",
            "entityId": "c1",
            "entityName": "Acme",
            "entityType": "Client",
            "clientName": "Acme",
            "publisherId": "pub1",
            "publisherName": "Indeed",
            "subject": "New client",
            "recipients": [],
            "status": status,
            "triggerType": "Manual",
            "createdAt": created_at
        }))
        .unwrap()
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let created = utc("2026-10-01T12:00:00Z");
        let seven_days = created + Duration::milliseconds(EXPIRY_WINDOW_MS);

        assert!(!is_expired(created, seven_days));
        assert!(is_expired(created, seven_days + Duration::milliseconds(1)));
        assert!(!is_expired(created, created));
    }

    #[test]
    fn reminder_buckets_follow_hour_thresholds() {
        let now = utc("2026-10-14T12:00:00Z");

        let fresh = now - Duration::hours(23) - Duration::minutes(59);
        assert_eq!(classify_reminder(fresh, now), None);

        let due = classify_reminder(now - Duration::hours(24), now).unwrap();
        assert_eq!(due.bucket, ReminderBucket::DueToday);
        assert_eq!(due.reminder_count, 1);

        let late_due = now - Duration::hours(71) - Duration::minutes(59);
        assert_eq!(classify_reminder(late_due, now).unwrap().bucket, ReminderBucket::DueToday);

        let overdue = classify_reminder(now - Duration::hours(72), now).unwrap();
        assert_eq!(overdue.bucket, ReminderBucket::Overdue);
        assert_eq!(overdue.reminder_count, 3);
    }

    #[test]
    fn reminder_at_fifty_hours_counts_two_days() {
        let now = utc("2026-10-14T12:00:00Z");
        let reminder = classify_reminder(now - Duration::hours(50), now).unwrap();

        assert_eq!(reminder.bucket, ReminderBucket::DueToday);
        assert_eq!(reminder.reminder_count, 2);
        assert_eq!(reminder.hours_since_sent, 50);
    }

    #[test]
    fn future_sent_at_is_not_eligible() {
        let now = utc("2026-10-14T12:00:00Z");
        assert_eq!(classify_reminder(now + Duration::hours(30), now), None);
    }

    #[test]
    fn expiring_soon_rounds_partial_days_up() {
        let now = utc("2026-10-14T12:00:00Z");

        assert!(is_expiring_soon(now + Duration::hours(1), now));
        assert!(is_expiring_soon(now + Duration::days(2), now));
        assert!(!is_expiring_soon(now + Duration::days(2) + Duration::milliseconds(1), now));
        assert!(!is_expiring_soon(now, now));
        assert!(!is_expiring_soon(now - Duration::hours(5), now));
    }

    #[test]
    fn ready_notification_lapses_after_a_week() {
        let now = utc("2026-10-14T12:00:00Z");

        let stale = notification(NotificationStatus::Ready, now - Duration::days(8));
        assert_eq!(effective_notification_status(&stale, now), NotificationStatus::Expired);

        let sent = notification(NotificationStatus::Sent, now - Duration::days(8));
        assert_eq!(effective_notification_status(&sent, now), NotificationStatus::Sent);

        let recent = notification(NotificationStatus::Ready, now - Duration::days(2));
        assert_eq!(effective_notification_status(&recent, now), NotificationStatus::Ready);
    }

    #[test]
    fn unsent_notification_has_no_reminder() {
        let now = utc("2026-10-14T12:00:00Z");
        let mut n = notification(NotificationStatus::Ready, now - Duration::days(5));
        assert_eq!(reminder_for(&n, now), None);

        n.sent_at = Some(now - Duration::hours(50));
        assert_eq!(reminder_for(&n, now).unwrap().bucket, ReminderBucket::DueToday);
    }

    #[test]
    fn today_covers_the_calendar_day() {
        let now = utc("2026-10-14T10:00:00Z");

        assert!(matches_date_range(utc("2026-10-14T00:00:00Z"), DateRangeKeyword::Today, &now));
        assert!(matches_date_range(utc("2026-10-14T23:59:59.999Z"), DateRangeKeyword::Today, &now));
        assert!(!matches_date_range(now - Duration::hours(25), DateRangeKeyword::Today, &now));
        assert!(matches_date_range(now - Duration::hours(25), DateRangeKeyword::Yesterday, &now));
    }

    #[test]
    fn week_starts_on_monday_even_from_sunday() {
        // 2026-10-18 is a Sunday.
        let sunday = utc("2026-10-18T15:00:00Z");
        let window = date_range_window(DateRangeKeyword::ThisWeek, &sunday).unwrap();

        assert_eq!(window.start, utc("2026-10-12T00:00:00Z"));
        assert_eq!(window.end, utc("2026-10-18T23:59:59.999Z"));

        let last = date_range_window(DateRangeKeyword::LastWeek, &sunday).unwrap();
        assert_eq!(last.start, utc("2026-10-05T00:00:00Z"));
        assert_eq!(last.end, utc("2026-10-11T23:59:59.999Z"));
    }

    #[test]
    fn week_window_from_midweek() {
        let wednesday = utc("2026-10-14T08:00:00Z");
        let window = date_range_window(DateRangeKeyword::ThisWeek, &wednesday).unwrap();
        assert_eq!(window.start, utc("2026-10-12T00:00:00Z"));
    }

    #[test]
    fn month_windows_cross_year_boundary() {
        let now = utc("2026-01-15T09:30:00Z");

        let this = date_range_window(DateRangeKeyword::ThisMonth, &now).unwrap();
        assert_eq!(this.start, utc("2026-01-01T00:00:00Z"));
        assert_eq!(this.end, utc("2026-01-31T23:59:59.999Z"));

        let last = date_range_window(DateRangeKeyword::LastMonth, &now).unwrap();
        assert_eq!(last.start, utc("2025-12-01T00:00:00Z"));
        assert_eq!(last.end, utc("2025-12-31T23:59:59.999Z"));
    }

    #[test]
    fn last_month_handles_short_february() {
        let now = utc("2026-03-01T00:00:00Z");
        let last = date_range_window(DateRangeKeyword::LastMonth, &now).unwrap();
        assert_eq!(last.end, utc("2026-02-28T23:59:59.999Z"));
    }

    #[test]
    fn last_thirty_days_starts_at_midnight() {
        let now = utc("2026-10-14T18:45:00Z");
        let window = date_range_window(DateRangeKeyword::Last30Days, &now).unwrap();

        assert_eq!(window.start, utc("2026-09-14T00:00:00Z"));
        assert_eq!(window.end, utc("2026-10-14T23:59:59.999Z"));
    }

    #[test]
    fn day_boundaries_follow_the_local_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 01:00 on the 14th in Tokyo, still the 13th in UTC.
        let now = utc("2026-10-13T16:00:00Z").with_timezone(&tokyo);

        let local_after_midnight = utc("2026-10-13T15:30:00Z");
        let local_before_midnight = utc("2026-10-13T14:59:00Z");

        assert!(matches_date_range(local_after_midnight, DateRangeKeyword::Today, &now));
        assert!(!matches_date_range(local_before_midnight, DateRangeKeyword::Today, &now));
        assert!(matches_date_range(local_before_midnight, DateRangeKeyword::Yesterday, &now));
    }

    /// Local clocks jump from 00:00 to 01:00 on 2018-11-04, moving from
    /// UTC-3 to UTC-2 at 03:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn standard() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }

        fn daylight() -> FixedOffset {
            FixedOffset::west_opt(2 * 3600).unwrap()
        }

        fn offset_at(utc: &NaiveDateTime) -> FixedOffset {
            let switch = NaiveDate::from_ymd_opt(2018, 11, 4)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap();
            if *utc < switch {
                Self::standard()
            } else {
                Self::daylight()
            }
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::standard(), Self::daylight()]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - Duration::seconds(offset.local_minus_utc() as i64);
                    Self::offset_at(&utc) == *offset
                })
                .collect();
            match valid.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(*only),
                [first, second, ..] => LocalResult::Ambiguous(*first, *second),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at(utc)
        }
    }

    #[test]
    fn skipped_midnight_starts_day_at_first_local_instant() {
        // 13:00 local on the day the clocks jumped.
        let now = MidnightGap.from_utc_datetime(&utc("2018-11-04T15:00:00Z").naive_utc());

        let window = date_range_window(DateRangeKeyword::Today, &now).unwrap();
        assert_eq!(window.start, utc("2018-11-04T03:00:00Z"));

        // 23:30 local on the 3rd.
        let late_previous_day = utc("2018-11-04T02:30:00Z");
        assert!(!matches_date_range(late_previous_day, DateRangeKeyword::Today, &now));
        assert!(matches_date_range(late_previous_day, DateRangeKeyword::Yesterday, &now));
        assert!(matches_date_range(utc("2018-11-04T03:00:00Z"), DateRangeKeyword::Today, &now));
    }

    #[test]
    fn date_range_matching_is_repeatable() {
        let now = utc("2026-10-14T10:00:00Z");
        let ts = utc("2026-10-09T10:00:00Z");
        let first = matches_date_range(ts, DateRangeKeyword::LastWeek, &now);
        let second = matches_date_range(ts, DateRangeKeyword::LastWeek, &now);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn keywords_parse_from_labels_and_slugs() {
        assert_eq!("Last 30 days".parse::<DateRangeKeyword>(), Ok(DateRangeKeyword::Last30Days));
        assert_eq!("this-week".parse::<DateRangeKeyword>(), Ok(DateRangeKeyword::ThisWeek));
        assert_eq!("LAST_MONTH".parse::<DateRangeKeyword>(), Ok(DateRangeKeyword::LastMonth));
        assert!("next week".parse::<DateRangeKeyword>().is_err());

        assert_eq!("due-today".parse::<ReminderBucket>(), Ok(ReminderBucket::DueToday));
    }
}
