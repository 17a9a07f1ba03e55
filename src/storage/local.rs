//! Local filesystem store.
//!
//! All reads return `None`/defaults for missing files so a fresh checkout
//! behaves like a first run. Writes are atomic (temp file + rename) so a
//! crash mid-write never leaves a truncated baseline or state file behind.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Baseline, EventResult, LastSeen, MonitorState, PathsConfig};
use crate::storage::{DebugError, JournalEntry};

/// Filesystem-backed store for baseline, state, journal, and debug artifacts.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
    state_dir: PathBuf,
}

impl LocalStore {
    /// Create a store over the configured directories.
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&paths.data_dir),
            state_dir: PathBuf::from(&paths.state_dir),
        }
    }

    fn baseline_path(&self, season: i32) -> PathBuf {
        self.data_dir.join(format!("baseline-{season}.json"))
    }

    fn journal_path(&self, season: i32) -> PathBuf {
        self.data_dir.join(format!("history-{season}.jsonl"))
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir.join("events.json")
    }

    fn last_seen_path(&self) -> PathBuf {
        self.state_dir.join("last_seen.json")
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &PathBuf, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &PathBuf) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, path: &PathBuf) -> Result<Option<T>> {
        match self.read_bytes(path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load the season baseline, if one has been written.
    pub async fn load_baseline(&self, season: i32) -> Result<Option<Baseline>> {
        self.read_json(&self.baseline_path(season)).await
    }

    /// Overwrite the season baseline.
    pub async fn save_baseline(&self, baseline: &Baseline) -> Result<()> {
        self.write_json(&self.baseline_path(baseline.season), baseline)
            .await
    }

    /// Create the baseline if missing. Returns the new baseline when this
    /// call created it, `None` when one already existed.
    pub async fn ensure_baseline(
        &self,
        season: i32,
        items: &[EventResult],
    ) -> Result<Option<Baseline>> {
        if self.load_baseline(season).await?.is_some() {
            return Ok(None);
        }
        let baseline = Baseline::new(season, items.to_vec());
        self.save_baseline(&baseline).await?;
        log::info!(
            "Baseline {} written ({} tournaments, hash {})",
            season,
            baseline.count,
            baseline.hash
        );
        Ok(Some(baseline))
    }

    /// Load the announcement state (empty on first run).
    pub async fn load_state(&self) -> Result<MonitorState> {
        Ok(self.read_json(&self.state_path()).await?.unwrap_or_default())
    }

    /// Persist the announcement state.
    pub async fn save_state(&self, state: &MonitorState) -> Result<()> {
        self.write_json(&self.state_path(), state).await
    }

    /// Timestamp of the last completed poll, if any.
    pub async fn load_last_check(&self) -> Result<Option<DateTime<Utc>>> {
        let seen: Option<LastSeen> = self.read_json(&self.last_seen_path()).await?;
        Ok(seen.and_then(|s| s.last_check_ts))
    }

    /// Record a completed poll.
    pub async fn save_last_check(&self, ts: DateTime<Utc>) -> Result<()> {
        let seen = LastSeen {
            last_check_ts: Some(ts),
        };
        self.write_json(&self.last_seen_path(), &seen).await
    }

    /// Append one entry to the season journal.
    pub async fn append_journal(&self, season: i32, entry: &JournalEntry) -> Result<()> {
        let path = self.journal_path(season);
        self.ensure_dir(&path).await?;

        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Record the failing step and error message.
    pub async fn write_debug(&self, step: &str, error: &str) -> Result<()> {
        let artifact = DebugError {
            ts: Utc::now(),
            step: step.to_string(),
            error: error.to_string(),
        };
        self.write_json(&self.data_dir.join("_debug_error.json"), &artifact)
            .await
    }

    /// Record the failing URL and whatever body came back with it.
    pub async fn write_debug_body(&self, url: &str, body: Option<&str>) -> Result<()> {
        self.write_bytes(&self.data_dir.join("_debug_last_url.txt"), url.as_bytes())
            .await?;
        if let Some(body) = body {
            self.write_bytes(
                &self.data_dir.join("_debug_last_response.html"),
                body.as_bytes(),
            )
            .await?;
        }
        Ok(())
    }
}
