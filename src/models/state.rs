//! Persisted monitor state.
//!
//! Two small JSON documents carry all memory between polls: the season
//! baseline (the raw rows as first observed) and the announcement state
//! (which rounds and finals have already been posted).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::EventResult;
use crate::utils::short_hash;

/// Snapshot of the season results at baseline time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub season: i32,
    pub created: DateTime<Utc>,
    pub count: usize,
    pub hash: String,
    pub items: Vec<EventResult>,
}

impl Baseline {
    pub fn new(season: i32, items: Vec<EventResult>) -> Self {
        Self {
            season,
            created: Utc::now(),
            count: items.len(),
            hash: short_hash(&items),
            items,
        }
    }
}

/// Announcement bookkeeping for all tracked events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default)]
    pub events: BTreeMap<String, EventState>,
}

/// Per-event announcement state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventState {
    /// Tournament name at first sighting
    pub name: String,

    /// Round number -> last announced strokes value
    #[serde(default)]
    pub rounds: BTreeMap<u8, String>,

    /// Whether the final summary has been posted
    #[serde(default)]
    pub finished: bool,
}

impl MonitorState {
    /// Get or create the state entry for an event key.
    pub fn entry(&mut self, key: &str, name: &str) -> &mut EventState {
        self.events
            .entry(key.to_string())
            .or_insert_with(|| EventState {
                name: name.to_string(),
                ..EventState::default()
            })
    }
}

/// Throttle bookkeeping, kept separate from event state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastSeen {
    #[serde(default)]
    pub last_check_ts: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_hash_tracks_items() {
        let a = Baseline::new(2025, vec![EventResult::default()]);
        let b = Baseline::new(2025, vec![EventResult::default()]);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.count, 1);

        let c = Baseline::new(2025, vec![]);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn test_entry_creates_once() {
        let mut state = MonitorState::default();
        state.entry("42", "Open").rounds.insert(1, "68".to_string());
        assert_eq!(state.entry("42", "Open").rounds.get(&1).unwrap(), "68");
        assert_eq!(state.events.len(), 1);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut state = MonitorState::default();
        let entry = state.entry("42", "Open");
        entry.rounds.insert(2, "71".to_string());
        entry.finished = true;

        let json = serde_json::to_string(&state).unwrap();
        let back: MonitorState = serde_json::from_str(&json).unwrap();
        let entry = &back.events["42"];
        assert_eq!(entry.rounds.get(&2).unwrap(), "71");
        assert!(entry.finished);
    }
}
