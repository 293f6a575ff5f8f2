use anyhow::{Context, Result};
use arcsim::journal::{self, format_entry};
use arcsim::{Settings, Snapshot};
use arcsim_core::{step_state, SimMetrics};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot document to simulate
    #[arg(long, env = "ARCSIM_SNAPSHOT")]
    snapshot: PathBuf,

    /// Where to write the updated snapshot (defaults to overwriting --snapshot)
    #[arg(long, env = "ARCSIM_OUTPUT")]
    output: Option<PathBuf>,

    /// Event journal to merge tick messages into
    #[arg(long, env = "ARCSIM_JOURNAL")]
    journal: Option<PathBuf>,

    /// JSON settings file (simulation constants and journal limits)
    #[arg(long, env = "ARCSIM_SETTINGS")]
    settings: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, env = "ARCSIM_CYCLES", default_value_t = 1)]
    cycles: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "ARCSIM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    #[cfg(feature = "tracy")]
    {
        arcsim_core::profiling::init_tracy(arcsim_core::profiling::TraceLevel::Info);
        let _client = tracy_client::Client::start();
    }

    let settings = Settings::load(args.settings.as_deref())?;
    let snapshot = Snapshot::load(&args.snapshot)?;

    let started = Instant::now();
    let mut world = snapshot.world().clone();
    let mut totals = SimMetrics::default();
    let mut lines = Vec::new();

    for cycle in 1..=args.cycles {
        let outcome = match step_state(&world, &settings.simulation) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(
                    "Tick {} for state {:?} failed after {:.3}s: {}. Nothing was saved.",
                    cycle,
                    world.acting_state,
                    started.elapsed().as_secs_f64(),
                    e
                );
                return Err(e).context("Simulation failed");
            }
        };
        lines.extend(outcome.entries().iter().map(format_entry));
        totals.absorb(&outcome.metrics);
        log::info!(
            "Tick {} | events: {} | tax income: {} | workers: {}/{}",
            cycle,
            outcome.events.len(),
            outcome.state.metrics.corporate_tax_income,
            outcome.state.metrics.workers_occupied,
            outcome.state.metrics.workers_available
        );
        world = outcome.state;
    }

    let output = args.output.as_ref().unwrap_or(&args.snapshot);
    snapshot.save(&world, output)?;

    if let Some(path) = &args.journal {
        let existing = journal::load_journal(path)?;
        let cells = journal::merge_journal(&existing, &lines, &settings.journal);
        journal::save_journal(path, &cells)?;
        log::info!("Journal {} now holds {} cells", path.display(), cells.len());
    }

    log::info!(
        "{}: {} ticks in {:.3}s (avg {:.2}ms/tick)",
        world.acting_state,
        totals.total_ticks,
        started.elapsed().as_secs_f64(),
        totals.tick_avg_ms()
    );
    Ok(())
}
