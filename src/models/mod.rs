// src/models/mod.rs

//! Domain models for the monitor application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod state;

// Re-export all public types
pub use config::{ApiConfig, Config, MonitorConfig, PathsConfig, PlayerConfig};
pub use event::{EventResult, SeasonResults, TourStatus};
pub use state::{Baseline, EventState, LastSeen, MonitorState};
