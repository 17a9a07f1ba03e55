//! Update calculation against the announcement state.
//!
//! Compares the fetched season rows with what has already been announced
//! and emits the updates to post. The state is mutated alongside, so a
//! second pass over the same input produces nothing — replays and overlapping
//! cron triggers stay silent.

use crate::models::{EventResult, MonitorState};

/// An announcement-worthy change in the season results.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// A tournament the state has never seen
    NewEvent { key: String, event: EventResult },

    /// A round score appeared or changed
    Round {
        key: String,
        tournament: String,
        round: u8,
        strokes: String,
        position: Option<String>,
        total: Option<String>,
        link: Option<String>,
    },

    /// The event is over; posted once per event
    Finished { key: String, event: EventResult },
}

impl Update {
    /// Event key this update belongs to.
    pub fn key(&self) -> &str {
        match self {
            Update::NewEvent { key, .. } => key,
            Update::Round { key, .. } => key,
            Update::Finished { key, .. } => key,
        }
    }
}

/// Walk the season rows and emit everything not yet announced.
///
/// For each event: a `NewEvent` when the key is unknown, then round updates
/// in ascending round order, then at most one `Finished`. Rounds compare as
/// trimmed strings so a corrected score re-announces. Nameless rows are
/// tracked under a placeholder name rather than skipped, so their rounds are
/// not replayed once the name arrives.
pub fn calculate_updates(results: &[EventResult], state: &mut MonitorState) -> Vec<Update> {
    let mut updates = Vec::new();

    for event in results {
        let key = event.key();
        let name = event.display_name();

        if !state.events.contains_key(&key) {
            updates.push(Update::NewEvent {
                key: key.clone(),
                event: event.clone(),
            });
        }
        let entry = state.entry(&key, name);

        for round in 1..=4u8 {
            let Some(strokes) = event.round(round) else {
                continue;
            };
            if entry.rounds.get(&round).map(String::as_str) == Some(strokes) {
                continue;
            }
            entry.rounds.insert(round, strokes.to_string());
            updates.push(Update::Round {
                key: key.clone(),
                tournament: name.to_string(),
                round,
                strokes: strokes.to_string(),
                position: event.position_desc(),
                total: event.total.clone(),
                link: event.link.clone(),
            });
        }

        if event.is_finished() && !entry.finished {
            entry.finished = true;
            updates.push(Update::Finished {
                key: key.clone(),
                event: event.clone(),
            });
        }
    }

    updates
}

/// Absorb the current rows into the state without emitting anything.
///
/// Used right after the baseline is created, so the backlog of past
/// tournaments is not announced as a storm of updates.
pub fn seed_state(results: &[EventResult], state: &mut MonitorState) {
    let _ = calculate_updates(results, state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: i64, name: &str) -> EventResult {
        EventResult {
            competition_id: Some(id),
            tournament: name.to_string(),
            ..EventResult::default()
        }
    }

    #[test]
    fn test_new_event_emitted_once() {
        let mut state = MonitorState::default();
        let results = vec![event(1, "Open A")];

        let updates = calculate_updates(&results, &mut state);
        assert_eq!(updates.len(), 1);
        assert!(matches!(&updates[0], Update::NewEvent { key, .. } if key == "1"));

        let again = calculate_updates(&results, &mut state);
        assert!(again.is_empty());
    }

    #[test]
    fn test_round_appears_then_changes() {
        let mut state = MonitorState::default();
        let mut ev = event(1, "Open A");
        ev.r1 = Some("68".to_string());

        let updates = calculate_updates(&[ev.clone()], &mut state);
        assert_eq!(updates.len(), 2); // new event + R1
        assert!(matches!(
            &updates[1],
            Update::Round { round: 1, strokes, .. } if strokes == "68"
        ));

        // Same value: silent.
        assert!(calculate_updates(&[ev.clone()], &mut state).is_empty());

        // Corrected score re-announces.
        ev.r1 = Some("67".to_string());
        let updates = calculate_updates(&[ev], &mut state);
        assert_eq!(updates.len(), 1);
        assert!(matches!(
            &updates[0],
            Update::Round { round: 1, strokes, .. } if strokes == "67"
        ));
    }

    #[test]
    fn test_rounds_ordered_finished_last() {
        let mut state = MonitorState::default();
        let mut ev = event(1, "Open A");
        ev.r1 = Some("68".to_string());
        ev.r2 = Some("71".to_string());
        ev.r3 = Some("70".to_string());
        ev.r4 = Some("69".to_string());
        ev.total = Some("278".to_string());

        let updates = calculate_updates(&[ev], &mut state);
        assert_eq!(updates.len(), 6); // new + 4 rounds + finished

        assert!(matches!(updates[0], Update::NewEvent { .. }));
        let rounds: Vec<u8> = updates
            .iter()
            .filter_map(|u| match u {
                Update::Round { round, .. } => Some(*round),
                _ => None,
            })
            .collect();
        assert_eq!(rounds, vec![1, 2, 3, 4]);
        assert!(matches!(updates.last().unwrap(), Update::Finished { .. }));
    }

    #[test]
    fn test_finished_only_once() {
        let mut state = MonitorState::default();
        let mut ev = event(1, "Open A");
        ev.r3 = Some("70".to_string());
        ev.total = Some("210".to_string());

        let updates = calculate_updates(&[ev.clone()], &mut state);
        assert!(updates.iter().any(|u| matches!(u, Update::Finished { .. })));

        let again = calculate_updates(&[ev], &mut state);
        assert!(again.is_empty());
    }

    #[test]
    fn test_blank_rounds_ignored() {
        let mut state = MonitorState::default();
        let mut ev = event(1, "Open A");
        ev.r1 = Some("   ".to_string());
        ev.r2 = Some(String::new());

        let updates = calculate_updates(&[ev], &mut state);
        assert_eq!(updates.len(), 1); // only the new-event notice
    }

    #[test]
    fn test_nameless_rows_tracked_under_placeholder() {
        let mut state = MonitorState::default();
        let mut ev = EventResult {
            competition_id: Some(7),
            r1: Some("68".to_string()),
            ..EventResult::default()
        };

        let updates = calculate_updates(&[ev.clone()], &mut state);
        assert_eq!(updates.len(), 2);
        assert!(matches!(
            &updates[1],
            Update::Round { tournament, .. } if tournament == "Unknown tournament"
        ));
        assert_eq!(state.events["7"].name, "Unknown tournament");

        // Name arriving later does not replay the announced round.
        ev.tournament = "Open A".to_string();
        let updates = calculate_updates(&[ev], &mut state);
        assert!(updates.is_empty());
    }

    #[test]
    fn test_seed_state_is_silent_afterwards() {
        let mut state = MonitorState::default();
        let mut ev = event(1, "Open A");
        ev.r1 = Some("68".to_string());

        seed_state(&[ev.clone()], &mut state);
        assert!(calculate_updates(&[ev], &mut state).is_empty());
    }

    #[test]
    fn test_independent_events() {
        let mut state = MonitorState::default();
        let mut a = event(1, "Open A");
        a.r1 = Some("68".to_string());
        let b = event(2, "Open B");

        let updates = calculate_updates(&[a, b], &mut state);
        let keys: Vec<&str> = updates.iter().map(Update::key).collect();
        assert_eq!(keys, vec!["1", "1", "2"]);
    }
}
