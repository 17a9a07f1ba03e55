//! Storage abstractions for monitor persistence.
//!
//! Everything lives in two directories of small JSON files:
//!
//! ```text
//! data/
//! ├── baseline-{season}.json    # Season snapshot at first sight
//! ├── history-{season}.jsonl    # Journal of announced updates
//! ├── _debug_error.json         # Last failure (step + error)
//! ├── _debug_last_url.txt       # URL of the failing request
//! └── _debug_last_response.html # Body of the failing request, if any
//! state/
//! ├── events.json               # Announcement state per event
//! └── last_seen.json            # Throttle bookkeeping
//! ```

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Re-export for convenience
pub use local::LocalStore;

/// One line of the season journal (`history-{season}.jsonl`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub ts: DateTime<Utc>,

    /// "baseline" | "new_event" | "round" | "finished"
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub event_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tournament: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub round: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub strokes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub count: Option<usize>,
}

impl JournalEntry {
    /// Entry recording that the season baseline was created.
    pub fn baseline(ts: DateTime<Utc>, count: usize) -> Self {
        Self {
            ts,
            kind: "baseline".to_string(),
            event_key: None,
            tournament: None,
            round: None,
            strokes: None,
            position: None,
            total: None,
            count: Some(count),
        }
    }
}

/// Debug artifact describing the last failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugError {
    pub ts: DateTime<Utc>,
    pub step: String,
    pub error: String,
}
