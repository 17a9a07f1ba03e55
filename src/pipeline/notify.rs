//! Discord webhook notifications.
//!
//! Round updates and final summaries go out as embeds, baseline and
//! new-tournament notices as plain content. Without a webhook URL the
//! payloads are logged instead, which doubles as a dry-run mode. Webhook
//! failures are logged and swallowed: a missed message must not abort the
//! cycle or lose state.

use std::time::Duration;

use serde_json::{Value, json};

use crate::error::Result;
use crate::models::EventResult;
use crate::pipeline::diff::Update;

const COLOR_ROUND: u32 = 0x2ecc71;
const COLOR_FINAL: u32 = 0x3498db;

/// Environment variable carrying the webhook URL.
pub const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK";

/// Webhook dispatcher.
pub struct Notifier {
    webhook: Option<String>,
    footer: String,
    client: reqwest::Client,
}

impl Notifier {
    /// Create a notifier; `webhook` of `None` means dry-run.
    pub fn new(webhook: Option<String>, footer: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            webhook: webhook.filter(|w| !w.trim().is_empty()),
            footer: footer.into(),
            client,
        })
    }

    /// Create a notifier from the `DISCORD_WEBHOOK` environment variable.
    pub fn from_env(footer: impl Into<String>) -> Result<Self> {
        Self::new(std::env::var(WEBHOOK_ENV).ok(), footer)
    }

    pub fn is_dry_run(&self) -> bool {
        self.webhook.is_none()
    }

    /// Send a raw webhook payload.
    async fn send(&self, payload: Value) {
        let Some(url) = &self.webhook else {
            log::info!("[dry-run] discord payload: {payload}");
            return;
        };
        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                log::debug!("Discord webhook delivered ({})", response.status());
            }
            Ok(response) => {
                log::error!("Discord webhook returned {}", response.status());
            }
            Err(e) => {
                log::error!("Discord webhook request failed: {e}");
            }
        }
    }

    /// Post a plain text message.
    pub async fn post_content(&self, text: &str) {
        self.send(json!({ "content": text })).await;
    }

    /// Post the message for one update.
    pub async fn post_update(&self, update: &Update) {
        match update {
            Update::NewEvent { event, .. } => {
                self.post_content(&format!("New tournament: {}", event.summary()))
                    .await;
            }
            Update::Round {
                tournament,
                round,
                strokes,
                position,
                total,
                link,
                ..
            } => {
                let embed = round_embed(
                    tournament,
                    *round,
                    strokes,
                    position.as_deref(),
                    total.as_deref(),
                    link.as_deref(),
                    &self.footer,
                );
                self.send(json!({ "embeds": [embed] })).await;
            }
            Update::Finished { event, .. } => {
                let embed = final_embed(event, &self.footer);
                self.send(json!({ "embeds": [embed] })).await;
            }
        }
    }
}

/// Render an optional value, falling back to a dash.
fn dash(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => v.to_string(),
        None => "–".to_string(),
    }
}

/// Embed for a completed or corrected round.
pub fn round_embed(
    tournament: &str,
    round: u8,
    strokes: &str,
    position: Option<&str>,
    total: Option<&str>,
    link: Option<&str>,
    footer: &str,
) -> Value {
    json!({
        "title": format!("Round update – {tournament}"),
        "url": link,
        "color": COLOR_ROUND,
        "fields": [
            { "name": "Round", "value": format!("R{round}"), "inline": true },
            { "name": "Position", "value": dash(position), "inline": true },
            { "name": format!("Strokes R{round}"), "value": strokes, "inline": true },
            { "name": "Total (so far)", "value": dash(total), "inline": true },
        ],
        "footer": { "text": footer },
    })
}

/// Embed for the final summary of a finished tournament.
pub fn final_embed(event: &EventResult, footer: &str) -> Value {
    let position = event.position_desc();
    json!({
        "title": format!("Tournament finished – {}", event.tournament),
        "url": event.link,
        "color": COLOR_FINAL,
        "fields": [
            { "name": "End date", "value": dash(event.end_date.as_deref()), "inline": true },
            { "name": "Position", "value": dash(position.as_deref()), "inline": true },
            { "name": "R2DR points", "value": dash(event.r2dr_points.as_deref()), "inline": true },
            { "name": "R2MR points", "value": dash(event.r2mr_points.as_deref()), "inline": true },
            { "name": "Prize money", "value": dash(event.prize_money.as_deref()), "inline": true },
            { "name": "R1", "value": dash(event.r1.as_deref()), "inline": true },
            { "name": "R2", "value": dash(event.r2.as_deref()), "inline": true },
            { "name": "R3", "value": dash(event.r3.as_deref()), "inline": true },
            { "name": "R4", "value": dash(event.r4.as_deref()), "inline": true },
            { "name": "Total", "value": dash(event.total.as_deref()), "inline": true },
            { "name": "To par", "value": dash(event.to_par.as_deref()), "inline": true },
        ],
        "footer": { "text": footer },
    })
}
