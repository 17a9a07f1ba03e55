//! Pipeline entry points for monitor operations.
//!
//! - `run_cycle`: one full poll (gate → fetch → diff → notify → persist)
//! - `fetch`: season results and tour status from the API
//! - `diff`: update calculation against the announcement state
//! - `gate`: live detection and idle throttling
//! - `notify`: Discord webhook dispatch

pub mod diff;
pub mod fetch;
pub mod gate;
pub mod notify;
pub mod run;

pub use diff::{Update, calculate_updates};
pub use fetch::{Fetcher, fetch_season_results, fetch_tour_status};
pub use gate::{GateDecision, should_poll};
pub use notify::Notifier;
pub use run::{CycleOutcome, run_cycle};
