//! tourwatch CLI
//!
//! Polls a tour player's season results, diffs them against local state, and
//! posts updates to Discord. Meant to be driven by an external scheduler
//! (cron / CI workflow) every 30 minutes; the internal gate decides whether
//! a trigger actually polls.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tourwatch::{
    error::Result,
    models::{Baseline, Config},
    pipeline::{self, Fetcher, Notifier, diff},
    storage::LocalStore,
};

/// tourwatch - DP World Tour results monitor
#[derive(Parser, Debug)]
#[command(
    name = "tourwatch",
    version,
    about = "Monitors tour player results and posts updates to Discord"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one poll cycle
    Run {
        /// Bypass the idle throttle gate
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show baseline and state summary
    Info,

    /// Fetch results and (re)write the season baseline
    Baseline {
        /// Overwrite an existing baseline
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let store = LocalStore::new(&config.paths);
    let season = config.season();

    match cli.command {
        Command::Run { force } => {
            let notifier =
                Notifier::from_env(format!("DP World Tour – {}", config.player.name))?;
            if notifier.is_dry_run() {
                log::warn!(
                    "{} not set; updates are logged, not posted",
                    pipeline::notify::WEBHOOK_ENV
                );
            }

            let outcome = pipeline::run_cycle(&config, &store, &notifier, force).await?;
            if outcome.polled {
                log::info!(
                    "Cycle complete ({}): {} update(s) posted{}",
                    outcome.reason,
                    outcome.updates_posted,
                    if outcome.baseline_created {
                        ", baseline created"
                    } else {
                        ""
                    }
                );
            } else {
                log::info!("Cycle skipped ({})", outcome.reason);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (player {} on tour {})", config.player.id, config.player.tour_id);
        }

        Command::Info => {
            log::info!("Season: {}", season);
            match store.load_baseline(season).await? {
                Some(baseline) => {
                    log::info!(
                        "Baseline: {} tournaments, hash {}, created {}",
                        baseline.count,
                        baseline.hash,
                        baseline.created
                    );
                }
                None => log::info!("Baseline: not set"),
            }

            let state = store.load_state().await?;
            log::info!("Tracked events: {}", state.events.len());
            let finished = state.events.values().filter(|e| e.finished).count();
            log::info!("Finished events announced: {}", finished);

            match store.load_last_check().await? {
                Some(ts) => log::info!("Last check: {}", ts),
                None => log::info!("Last check: never"),
            }
        }

        Command::Baseline { force } => {
            if store.load_baseline(season).await?.is_some() && !force {
                log::warn!(
                    "Baseline for {} already exists. Use --force to overwrite.",
                    season
                );
                return Ok(());
            }

            let fetcher = Fetcher::new(&config)?;
            let results = pipeline::fetch_season_results(&fetcher, &store, season).await?;

            let baseline = Baseline::new(season, results.results.clone());
            store.save_baseline(&baseline).await?;

            let mut state = store.load_state().await?;
            diff::seed_state(&results.results, &mut state);
            store.save_state(&state).await?;

            log::info!(
                "Baseline {} written ({} tournaments, hash {})",
                season,
                baseline.count,
                baseline.hash
            );
        }
    }

    Ok(())
}
