//! Throttle gate for the poll cycle.
//!
//! The external trigger fires every 30 minutes; this gate decides whether a
//! trigger actually polls. Live tournaments poll on every trigger, otherwise
//! polls are spaced out to the configured idle interval.

use chrono::{DateTime, Duration, Utc};

use crate::models::EventResult;

/// Outcome of the gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub proceed: bool,
    pub reason: &'static str,
}

/// Decide whether this trigger should poll.
pub fn should_poll(
    live: bool,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    idle_interval: Duration,
) -> GateDecision {
    if live {
        return GateDecision {
            proceed: true,
            reason: "live",
        };
    }
    match last_check {
        None => GateDecision {
            proceed: true,
            reason: "first",
        },
        Some(last) if now - last >= idle_interval => GateDecision {
            proceed: true,
            reason: "interval-elapsed",
        },
        Some(_) => GateDecision {
            proceed: false,
            reason: "throttled",
        },
    }
}

/// Event whose end date is closest to `now`, in either direction.
pub fn nearest_event<'a>(events: &'a [EventResult], now: DateTime<Utc>) -> Option<&'a EventResult> {
    events
        .iter()
        .filter_map(|event| event.end_date_utc().map(|end| (event, end)))
        .min_by_key(|(_, end)| (*end - now).abs().num_seconds())
        .map(|(event, _)| event)
}

/// Whether `now` falls in the event's live window around its end date.
///
/// Tour events run up to four days, so the window opens `days_before` days
/// ahead of the end date and closes `hours_after` hours past it.
pub fn in_live_window(
    event: &EventResult,
    now: DateTime<Utc>,
    days_before: i64,
    hours_after: i64,
) -> bool {
    match event.end_date_utc() {
        Some(end) => {
            end - Duration::days(days_before) <= now && now <= end + Duration::hours(hours_after)
        }
        None => false,
    }
}
