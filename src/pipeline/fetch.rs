//! Fetching season results and tour status from the tour API.
//!
//! The tour site sits behind aggressive bot protection, so requests carry
//! browser-like headers with a rotated User-Agent, retry with exponential
//! backoff on 403/429/503, and can be routed through a relay worker that
//! takes the target as a `?url=` parameter. When everything fails, debug
//! artifacts land in the data directory before the error propagates.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderValue, ORIGIN, PRAGMA,
    REFERER, USER_AGENT,
};

use crate::error::{AppError, Result};
use crate::models::{Config, SeasonResults, TourStatus};
use crate::storage::LocalStore;

/// Why a request ultimately failed, with material for debug artifacts.
#[derive(Debug)]
pub(crate) struct FetchFailure {
    pub url: String,
    pub message: String,
    pub body: Option<String>,
}

/// HTTP fetcher for the tour API.
pub struct Fetcher {
    config: Config,
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher with a configured HTTP client.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Browser-like headers with a User-Agent picked from the pool.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let pool = &self.config.api.user_agents;
        if let Some(ua) = pool.choose(&mut rand::thread_rng()) {
            if let Ok(value) = HeaderValue::from_str(ua) {
                headers.insert(USER_AGENT, value);
            }
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("de-DE,de;q=0.9,en;q=0.8"),
        );
        if let Ok(value) = HeaderValue::from_str(&self.config.referer()) {
            headers.insert(REFERER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.config.api.base_url) {
            headers.insert(ORIGIN, value);
        }
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers
    }

    /// Route a target URL through the relay, when one is configured.
    fn effective_url(&self, target: &str) -> String {
        match self.config.api.relay() {
            Some(relay) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
                format!("{relay}?url={encoded}")
            }
            None => target.to_string(),
        }
    }

    /// GET a URL as JSON with retries and backoff.
    pub(crate) async fn get_json(
        &self,
        target: &str,
    ) -> std::result::Result<serde_json::Value, FetchFailure> {
        let url = self.effective_url(target);
        let mut last_message = String::from("no attempt made");
        let mut last_body = None;

        for attempt in 0..self.config.api.max_retries {
            if attempt > 0 {
                let base = self.config.api.retry_base_secs as f64;
                let delay = (base * f64::powi(2.0, attempt as i32 - 1)).min(20.0);
                let jitter: f64 = rand::thread_rng().gen_range(0.0..1.5);
                tokio::time::sleep(Duration::from_secs_f64(delay + jitter)).await;
            }

            log::debug!("GET {} (attempt {})", url, attempt + 1);
            match self.client.get(&url).headers(self.headers()).send().await {
                Ok(response) if response.status().is_success() => {
                    let text = match response.text().await {
                        Ok(text) => text,
                        Err(e) => {
                            last_message = format!("body read failed: {e}");
                            continue;
                        }
                    };
                    match serde_json::from_str(&text) {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            last_message = format!("response is not JSON: {e}");
                            last_body = Some(text);
                        }
                    }
                }
                Ok(response) => {
                    last_message = format!("http {}", response.status());
                    last_body = response.text().await.ok();
                }
                Err(e) => {
                    last_message = e.to_string();
                }
            }
        }

        Err(FetchFailure {
            url,
            message: last_message,
            body: last_body,
        })
    }
}

/// Fetch the player's season results.
///
/// Tries the tour-scoped URL first, then the unscoped fallback. On final
/// failure writes debug artifacts through `store` and returns a fetch error.
pub async fn fetch_season_results(
    fetcher: &Fetcher,
    store: &LocalStore,
    season: i32,
) -> Result<SeasonResults> {
    let urls = [
        fetcher.config().results_url(season),
        fetcher.config().results_url_fallback(season),
    ];

    let mut last_failure: Option<FetchFailure> = None;
    for url in &urls {
        match fetcher.get_json(url).await {
            Ok(value) => {
                let mut results: SeasonResults = match serde_json::from_value(value) {
                    Ok(results) => results,
                    Err(e) => {
                        store.write_debug("parse", &e.to_string()).await.ok();
                        return Err(AppError::Json(e));
                    }
                };
                if results.season.is_none() {
                    results.season = Some(season);
                }
                log::info!(
                    "Fetched {} tournaments for season {}",
                    results.results.len(),
                    season
                );
                return Ok(results);
            }
            Err(failure) => {
                log::warn!("Results fetch failed for {}: {}", failure.url, failure.message);
                last_failure = Some(failure);
            }
        }
    }

    match last_failure {
        Some(failure) => {
            store.write_debug("fetch", &failure.message).await.ok();
            store
                .write_debug_body(&failure.url, failure.body.as_deref())
                .await
                .ok();
            Err(AppError::fetch(failure.url, failure.message))
        }
        None => Err(AppError::fetch("", "no results URL configured")),
    }
}

/// Fetch the tour-wide event status list.
///
/// Callers treat failures as "not live", so this stays a plain Result.
pub async fn fetch_tour_status(fetcher: &Fetcher) -> Result<Vec<TourStatus>> {
    let url = fetcher.config().status_url();
    let value = fetcher
        .get_json(&url)
        .await
        .map_err(|f| AppError::fetch(f.url, f.message))?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiConfig;

    fn config_with_relay(relay: Option<&str>) -> Config {
        let mut config = Config::default();
        config.api = ApiConfig {
            relay_base: relay.map(str::to_string),
            ..ApiConfig::default()
        };
        config
    }

    #[test]
    fn test_effective_url_without_relay() {
        let fetcher = Fetcher::new(&config_with_relay(None)).unwrap();
        assert_eq!(
            fetcher.effective_url("https://example.com/api?x=1"),
            "https://example.com/api?x=1"
        );
    }

    #[test]
    fn test_effective_url_encodes_target() {
        let fetcher =
            Fetcher::new(&config_with_relay(Some("https://relay.example.dev/"))).unwrap();
        let url = fetcher.effective_url("https://example.com/api?x=1");
        assert!(url.starts_with("https://relay.example.dev?url="));
        assert!(url.contains("%3A%2F%2F"));
        assert!(!url.contains("api?x"));
    }

    #[test]
    fn test_headers_present() {
        let fetcher = Fetcher::new(&Config::default()).unwrap();
        let headers = fetcher.headers();
        assert!(headers.contains_key(USER_AGENT));
        assert!(headers.contains_key(REFERER));
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
    }
}
