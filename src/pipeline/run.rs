//! One full poll cycle: gate, fetch, diff, notify, persist.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::{Baseline, Config, SeasonResults};
use crate::pipeline::diff::{self, Update};
use crate::pipeline::fetch::{self, Fetcher};
use crate::pipeline::gate;
use crate::pipeline::notify::Notifier;
use crate::storage::{JournalEntry, LocalStore};

/// Summary of a cycle, for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// Whether the API was polled at all
    pub polled: bool,
    /// Gate reason ("live", "first", "interval-elapsed", "throttled", "forced")
    pub reason: String,
    /// Updates announced this cycle
    pub updates_posted: usize,
    /// Whether this cycle created the season baseline
    pub baseline_created: bool,
}

/// Run one poll cycle.
///
/// `force` bypasses the throttle gate, not the rest of the flow.
pub async fn run_cycle(
    config: &Config,
    store: &LocalStore,
    notifier: &Notifier,
    force: bool,
) -> Result<CycleOutcome> {
    let now = Utc::now();
    let season = config.season();
    let fetcher = Fetcher::new(config)?;

    let live = is_live(config, store, &fetcher, now).await;
    let last_check = store.load_last_check().await?;
    let decision = gate::should_poll(
        live,
        last_check,
        now,
        Duration::hours(config.monitor.idle_interval_hours as i64),
    );

    let reason = if decision.proceed {
        decision.reason
    } else if force {
        "forced"
    } else {
        log::info!("Skipping poll: {}", decision.reason);
        return Ok(CycleOutcome {
            polled: false,
            reason: decision.reason.to_string(),
            ..CycleOutcome::default()
        });
    };
    log::info!("Polling season {season} results ({reason})");

    let results = fetch::fetch_season_results(&fetcher, store, season).await?;
    process_results(config, store, notifier, now, &results, reason).await
}

/// Diff, announce, and persist one fetched result set.
///
/// Split off from `run_cycle` so the cycle semantics past the fetch can be
/// exercised against a local store.
async fn process_results(
    config: &Config,
    store: &LocalStore,
    notifier: &Notifier,
    now: DateTime<Utc>,
    results: &SeasonResults,
    reason: &str,
) -> Result<CycleOutcome> {
    let season = results.season.unwrap_or_else(|| config.season());

    // First sighting of this season: record the baseline, absorb the backlog
    // into the state, announce that the monitor is up, and stop.
    if let Some(baseline) = store.ensure_baseline(season, &results.results).await? {
        let mut state = store.load_state().await?;
        diff::seed_state(&results.results, &mut state);
        store.save_state(&state).await?;

        notifier
            .post_content(&format!(
                "Monitor active. Baseline {} set ({} tournaments).",
                season, baseline.count
            ))
            .await;
        store
            .append_journal(season, &JournalEntry::baseline(now, baseline.count))
            .await?;
        store.save_last_check(now).await?;

        return Ok(CycleOutcome {
            polled: true,
            reason: "baseline".to_string(),
            updates_posted: 0,
            baseline_created: true,
        });
    }

    let mut state = store.load_state().await?;
    let updates = diff::calculate_updates(&results.results, &mut state);

    for update in &updates {
        notifier.post_update(update).await;
        store.append_journal(season, &journal_entry(now, update)).await?;
    }
    if updates.is_empty() {
        log::info!("No changes detected");
    } else {
        log::info!("Announced {} update(s)", updates.len());
    }

    store.save_state(&state).await?;
    // Refresh the baseline snapshot so the next pre-fetch live check sees
    // current end dates.
    store
        .save_baseline(&Baseline::new(season, results.results.clone()))
        .await?;
    store.save_last_check(now).await?;

    Ok(CycleOutcome {
        polled: true,
        reason: reason.to_string(),
        updates_posted: updates.len(),
        baseline_created: false,
    })
}

/// Live detection: the tour status endpoint, or the end-date window of the
/// nearest baselined event. The window also covers the endpoint lagging
/// behind or answering with a stale non-live list mid-tournament.
async fn is_live(
    config: &Config,
    store: &LocalStore,
    fetcher: &Fetcher,
    now: DateTime<Utc>,
) -> bool {
    match fetch::fetch_tour_status(fetcher).await {
        Ok(statuses) => {
            if statuses.iter().any(|s| s.is_live(config.player.tour_id)) {
                log::info!("Live event reported by the status endpoint");
                return true;
            }
        }
        Err(e) => {
            log::debug!("Status endpoint unavailable ({e})");
        }
    }
    baseline_window_live(config, store, now).await
}

/// Whether `now` falls in the live window of the nearest baselined event.
async fn baseline_window_live(config: &Config, store: &LocalStore, now: DateTime<Utc>) -> bool {
    match store.load_baseline(config.season()).await {
        Ok(Some(baseline)) => gate::nearest_event(&baseline.items, now)
            .map(|event| {
                gate::in_live_window(
                    event,
                    now,
                    config.monitor.live_window_days_before_end,
                    config.monitor.live_window_hours_after_end,
                )
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Journal line for an announced update.
fn journal_entry(ts: DateTime<Utc>, update: &Update) -> JournalEntry {
    match update {
        Update::NewEvent { key, event } => JournalEntry {
            ts,
            kind: "new_event".to_string(),
            event_key: Some(key.clone()),
            tournament: Some(event.tournament.clone()),
            round: None,
            strokes: None,
            position: event.position_desc(),
            total: event.total.clone(),
            count: None,
        },
        Update::Round {
            key,
            tournament,
            round,
            strokes,
            position,
            total,
            ..
        } => JournalEntry {
            ts,
            kind: "round".to_string(),
            event_key: Some(key.clone()),
            tournament: Some(tournament.clone()),
            round: Some(*round),
            strokes: Some(strokes.clone()),
            position: position.clone(),
            total: total.clone(),
            count: None,
        },
        Update::Finished { key, event } => JournalEntry {
            ts,
            kind: "finished".to_string(),
            event_key: Some(key.clone()),
            tournament: Some(event.tournament.clone()),
            round: None,
            strokes: None,
            position: event.position_desc(),
            total: event.total.clone(),
            count: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventResult, PathsConfig};
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> LocalStore {
        LocalStore::new(&PathsConfig {
            data_dir: tmp.path().join("data").to_string_lossy().into_owned(),
            state_dir: tmp.path().join("state").to_string_lossy().into_owned(),
        })
    }

    fn season_with(results: Vec<EventResult>) -> SeasonResults {
        SeasonResults {
            season: Some(2025),
            results,
        }
    }

    #[tokio::test]
    async fn test_first_cycle_creates_baseline_without_announcing() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let notifier = Notifier::new(None, "test").unwrap();
        let config = Config::default();

        let ev = EventResult {
            competition_id: Some(1),
            tournament: "Open A".to_string(),
            r1: Some("68".to_string()),
            r2: Some("71".to_string()),
            ..EventResult::default()
        };
        let results = season_with(vec![ev]);

        let outcome = process_results(&config, &store, &notifier, Utc::now(), &results, "first")
            .await
            .unwrap();
        assert!(outcome.polled);
        assert!(outcome.baseline_created);
        assert_eq!(outcome.updates_posted, 0);
        assert_eq!(outcome.reason, "baseline");

        // Backlog absorbed, nothing left to announce on disk either.
        let state = store.load_state().await.unwrap();
        assert_eq!(state.events["1"].rounds.get(&1).unwrap(), "68");
        assert!(store.load_baseline(2025).await.unwrap().is_some());
        assert!(store.load_last_check().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replayed_cycle_is_silent_until_rounds_change() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let notifier = Notifier::new(None, "test").unwrap();
        let config = Config::default();

        let mut ev = EventResult {
            competition_id: Some(1),
            tournament: "Open A".to_string(),
            r1: Some("68".to_string()),
            ..EventResult::default()
        };
        let results = season_with(vec![ev.clone()]);
        process_results(&config, &store, &notifier, Utc::now(), &results, "first")
            .await
            .unwrap();

        // Same rows again: no announcements.
        let outcome = process_results(
            &config,
            &store,
            &notifier,
            Utc::now(),
            &results,
            "interval-elapsed",
        )
        .await
        .unwrap();
        assert!(!outcome.baseline_created);
        assert_eq!(outcome.updates_posted, 0);

        // A new round score announces exactly once.
        ev.r2 = Some("71".to_string());
        let results = season_with(vec![ev]);
        let outcome = process_results(&config, &store, &notifier, Utc::now(), &results, "live")
            .await
            .unwrap();
        assert_eq!(outcome.updates_posted, 1);

        let outcome = process_results(&config, &store, &notifier, Utc::now(), &results, "live")
            .await
            .unwrap();
        assert_eq!(outcome.updates_posted, 0);
    }

    #[tokio::test]
    async fn test_baseline_window_flags_live_near_end_date() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let mut config = Config::default();
        config.monitor.season = Some(2025);

        let ev = EventResult {
            tournament: "Open".to_string(),
            end_date: Some("2025-06-29T18:00:00Z".to_string()),
            ..EventResult::default()
        };
        store
            .save_baseline(&Baseline::new(2025, vec![ev]))
            .await
            .unwrap();

        let during: DateTime<Utc> = "2025-06-28T10:00:00Z".parse().unwrap();
        assert!(baseline_window_live(&config, &store, during).await);

        let off_week: DateTime<Utc> = "2025-05-01T10:00:00Z".parse().unwrap();
        assert!(!baseline_window_live(&config, &store, off_week).await);
    }

    #[tokio::test]
    async fn test_baseline_window_without_baseline_is_not_live() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let mut config = Config::default();
        config.monitor.season = Some(2025);

        assert!(!baseline_window_live(&config, &store, Utc::now()).await);
    }

    #[test]
    fn test_journal_entry_for_round() {
        let update = Update::Round {
            key: "42".to_string(),
            tournament: "Open".to_string(),
            round: 3,
            strokes: "70".to_string(),
            position: Some("T8".to_string()),
            total: Some("209".to_string()),
            link: None,
        };

        let entry = journal_entry(Utc::now(), &update);
        assert_eq!(entry.kind, "round");
        assert_eq!(entry.event_key.as_deref(), Some("42"));
        assert_eq!(entry.round, Some(3));
        assert_eq!(entry.strokes.as_deref(), Some("70"));
    }

    #[test]
    fn test_journal_entry_for_finished() {
        let event = EventResult {
            competition_id: Some(42),
            tournament: "Open".to_string(),
            position_text: Some("T8".to_string()),
            total: Some("278".to_string()),
            ..EventResult::default()
        };
        let update = Update::Finished {
            key: event.key(),
            event,
        };

        let entry = journal_entry(Utc::now(), &update);
        assert_eq!(entry.kind, "finished");
        assert_eq!(entry.position.as_deref(), Some("T8"));
        assert_eq!(entry.total.as_deref(), Some("278"));
    }
}
