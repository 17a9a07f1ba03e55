//! Season result data structures.
//!
//! Mirrors the rows returned by the DP World Tour season-results endpoint.
//! The API is loose about field names across seasons, so the wire format is
//! tolerated with aliases and every field is optional.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::short_hash;

/// One tournament row from the player's season results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventResult {
    /// Stable event identifier (the season API calls it CompetitionId)
    #[serde(rename = "CompetitionId", alias = "EventId")]
    pub competition_id: Option<i64>,

    /// Tournament display name
    #[serde(rename = "Tournament", alias = "TournamentName", alias = "EventName")]
    pub tournament: String,

    /// ISO 8601 end date of the event
    #[serde(rename = "EndDate")]
    pub end_date: Option<String>,

    /// Round scores as reported (strokes, kept as text: "68", "WD", ...)
    #[serde(rename = "R1")]
    pub r1: Option<String>,
    #[serde(rename = "R2")]
    pub r2: Option<String>,
    #[serde(rename = "R3")]
    pub r3: Option<String>,
    #[serde(rename = "R4")]
    pub r4: Option<String>,

    /// Total strokes over all completed rounds
    #[serde(rename = "Total")]
    pub total: Option<String>,

    /// Cumulative score against par
    #[serde(rename = "ToPar")]
    pub to_par: Option<String>,

    /// Position as displayed ("T12", "1", "MC")
    #[serde(rename = "PositionText", alias = "Pos")]
    pub position_text: Option<String>,

    /// Numeric position, when the text form is absent
    #[serde(rename = "Position")]
    pub position: Option<i64>,

    /// Prize money, formatted by the API
    #[serde(rename = "PrizeMoney")]
    pub prize_money: Option<String>,

    /// Race to Dubai ranking points
    #[serde(rename = "R2DRPoints", alias = "R2DR")]
    pub r2dr_points: Option<String>,

    /// Road to Mallorca ranking points
    #[serde(rename = "R2MRPoints", alias = "R2MR")]
    pub r2mr_points: Option<String>,

    /// Link to the tournament page
    #[serde(rename = "Link", alias = "TournamentUrl")]
    pub link: Option<String>,
}

impl EventResult {
    /// Stable key for this event across polls.
    ///
    /// Uses the competition id when present, otherwise a truncated hash of
    /// the name and end date.
    pub fn key(&self) -> String {
        match self.competition_id {
            Some(id) => id.to_string(),
            None => short_hash(&(&self.tournament, &self.end_date)),
        }
    }

    /// Tournament name for display. The API occasionally ships a row before
    /// its name is filled in; those fall back to a placeholder.
    pub fn display_name(&self) -> &str {
        let name = self.tournament.trim();
        if name.is_empty() {
            "Unknown tournament"
        } else {
            name
        }
    }

    /// Score for round `no` (1..=4), trimmed; `None` if not yet played.
    pub fn round(&self, no: u8) -> Option<&str> {
        let raw = match no {
            1 => &self.r1,
            2 => &self.r2,
            3 => &self.r3,
            4 => &self.r4,
            _ => return None,
        };
        raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Position fallback chain: text form, then the numeric column.
    pub fn position_desc(&self) -> Option<String> {
        self.position_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.position.map(|p| p.to_string()))
    }

    /// Whether the event is over for this player.
    ///
    /// Finished means a total is reported and the last round score is in
    /// (R4, or R3 for rain-shortened events).
    pub fn is_finished(&self) -> bool {
        let total = self.total.as_deref().map(str::trim).unwrap_or("");
        !total.is_empty() && (self.round(4).is_some() || self.round(3).is_some())
    }

    /// Parse the end date, accepting both offset-carrying and naive forms.
    pub fn end_date_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.end_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                raw.parse::<NaiveDateTime>()
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
    }

    /// One-line summary: name, position, total.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.display_name().to_string()];
        if let Some(pos) = self.position_desc() {
            parts.push(pos);
        }
        if let Some(total) = self.total.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(format!("({total})"));
        }
        parts.join(" ")
    }
}

/// A full season of results for one player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SeasonResultsWire")]
pub struct SeasonResults {
    /// Season year as reported by the API (filled in by the fetcher if absent)
    #[serde(rename = "Season")]
    pub season: Option<i32>,

    /// Tournament rows
    #[serde(rename = "Results")]
    pub results: Vec<EventResult>,
}

/// The API has shipped both a bare array and a `{Season, Results}` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeasonResultsWire {
    Wrapped {
        #[serde(rename = "Season")]
        season: Option<i32>,
        #[serde(rename = "Results", default)]
        results: Vec<EventResult>,
    },
    Bare(Vec<EventResult>),
}

impl From<SeasonResultsWire> for SeasonResults {
    fn from(wire: SeasonResultsWire) -> Self {
        match wire {
            SeasonResultsWire::Wrapped { season, results } => Self { season, results },
            SeasonResultsWire::Bare(results) => Self {
                season: None,
                results,
            },
        }
    }
}

/// One row of the tour-wide event status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TourStatus {
    #[serde(rename = "TourId")]
    pub tour_id: Option<i64>,

    #[serde(rename = "Status")]
    pub status: Option<i64>,

    #[serde(rename = "RoundStatus")]
    pub round_status: Option<i64>,
}

impl TourStatus {
    /// Live when the event or its current round is reported as started/running.
    pub fn is_live(&self, tour_id: i64) -> bool {
        self.tour_id == Some(tour_id)
            && (matches!(self.status, Some(1 | 2)) || matches!(self.round_status, Some(1 | 2)))
    }
}
