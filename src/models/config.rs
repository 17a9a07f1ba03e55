//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::current_season;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tracked player
    #[serde(default)]
    pub player: PlayerConfig,

    /// Tour API endpoints and HTTP behavior
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling and throttle behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Data and state directories
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.player.id <= 0 {
            return Err(AppError::validation("player.id must be > 0"));
        }
        if self.player.name.trim().is_empty() {
            return Err(AppError::validation("player.name is empty"));
        }
        Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is invalid: {e}")))?;
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.max_retries == 0 {
            return Err(AppError::validation("api.max_retries must be > 0"));
        }
        if self.api.user_agents.is_empty() {
            return Err(AppError::validation("api.user_agents is empty"));
        }
        if self.monitor.idle_interval_hours == 0 {
            return Err(AppError::validation(
                "monitor.idle_interval_hours must be > 0",
            ));
        }
        Ok(())
    }

    /// Season to monitor: configured value, or the current UTC year.
    pub fn season(&self) -> i32 {
        self.monitor.season.unwrap_or_else(current_season)
    }

    /// Season results endpoint, scoped to the configured tour.
    ///
    /// The tourId parameter matters: without it the API sometimes returns
    /// empty lists.
    pub fn results_url(&self, season: i32) -> String {
        format!(
            "{}/api/v1/players/{}/results/{}/?tourId={}",
            self.api.base_url, self.player.id, season, self.player.tour_id
        )
    }

    /// Season results endpoint without the tour scope (fallback).
    pub fn results_url_fallback(&self, season: i32) -> String {
        format!(
            "{}/api/v1/players/{}/results/{}/",
            self.api.base_url, self.player.id, season
        )
    }

    /// Tour-wide event status endpoint.
    pub fn status_url(&self) -> String {
        format!("{}/api/sportdata/Event/Status", self.api.base_url)
    }

    /// Referer header value for API requests.
    pub fn referer(&self) -> String {
        format!("{}/", self.api.base_url)
    }
}

/// Tracked player settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Player id on the tour site
    #[serde(default = "defaults::player_id")]
    pub id: i64,

    /// Display name for messages
    #[serde(default = "defaults::player_name")]
    pub name: String,

    /// Tour id (1 = DP World Tour)
    #[serde(default = "defaults::tour_id")]
    pub tour_id: i64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: defaults::player_id(),
            name: defaults::player_name(),
            tour_id: defaults::tour_id(),
        }
    }
}

/// HTTP client and endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Tour site base URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Optional relay base URL; requests go through `{relay}?url={target}`
    #[serde(default)]
    pub relay_base: Option<String>,

    /// User-Agent pool, one picked per request
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per URL before giving up
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in seconds
    #[serde(default = "defaults::retry_base")]
    pub retry_base_secs: u64,
}

impl ApiConfig {
    /// Relay base with trailing slashes stripped, `None` when unset or blank.
    pub fn relay(&self) -> Option<&str> {
        self.relay_base
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.trim().is_empty())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            relay_base: None,
            user_agents: defaults::user_agents(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            retry_base_secs: defaults::retry_base(),
        }
    }
}

/// Polling and throttle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Season override; unset means current UTC year
    #[serde(default)]
    pub season: Option<i32>,

    /// Minimum hours between polls when no event is live
    #[serde(default = "defaults::idle_interval")]
    pub idle_interval_hours: u32,

    /// Days before an event's end date that count as live
    #[serde(default = "defaults::live_days_before")]
    pub live_window_days_before_end: i64,

    /// Hours after an event's end date that still count as live
    #[serde(default = "defaults::live_hours_after")]
    pub live_window_hours_after_end: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            season: None,
            idle_interval_hours: defaults::idle_interval(),
            live_window_days_before_end: defaults::live_days_before(),
            live_window_hours_after_end: defaults::live_hours_after(),
        }
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Baseline, journal, and debug artifacts
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,

    /// Announcement state and throttle bookkeeping
    #[serde(default = "defaults::state_dir")]
    pub state_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            state_dir: defaults::state_dir(),
        }
    }
}

mod defaults {
    // Player defaults
    pub fn player_id() -> i64 {
        35703
    }
    pub fn player_name() -> String {
        "Marcel Schneider".into()
    }
    pub fn tour_id() -> i64 {
        1
    }

    // API defaults
    pub fn base_url() -> String {
        "https://www.europeantour.com".into()
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127 Safari/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15".into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126 Safari/537.36".into(),
        ]
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        4
    }
    pub fn retry_base() -> u64 {
        2
    }

    // Monitor defaults
    pub fn idle_interval() -> u32 {
        2
    }
    pub fn live_days_before() -> i64 {
        3
    }
    pub fn live_hours_after() -> i64 {
        12
    }

    // Path defaults
    pub fn data_dir() -> String {
        "data".into()
    }
    pub fn state_dir() -> String {
        "state".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agents() {
        let mut config = Config::default();
        config.api.user_agents.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_idle_interval() {
        let mut config = Config::default();
        config.monitor.idle_interval_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_results_url_carries_tour_id() {
        let config = Config::default();
        let url = config.results_url(2025);
        assert!(url.contains("/api/v1/players/35703/results/2025/"));
        assert!(url.ends_with("?tourId=1"));
        assert!(!config.results_url_fallback(2025).contains("tourId"));
    }

    #[test]
    fn test_relay_normalization() {
        let mut api = ApiConfig::default();
        assert!(api.relay().is_none());

        api.relay_base = Some("".to_string());
        assert!(api.relay().is_none());

        api.relay_base = Some("https://relay.example.workers.dev/".to_string());
        assert_eq!(api.relay(), Some("https://relay.example.workers.dev"));
    }

    #[test]
    fn test_season_override() {
        let mut config = Config::default();
        config.monitor.season = Some(2024);
        assert_eq!(config.season(), 2024);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [player]
            id = 99
            name = "Test Player"

            [monitor]
            idle_interval_hours = 4
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.player.id, 99);
        assert_eq!(config.player.tour_id, 1);
        assert_eq!(config.monitor.idle_interval_hours, 4);
        assert_eq!(config.paths.data_dir, "data");
    }
}
