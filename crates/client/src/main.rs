//! Kingdom simulation binary.
//!
//! Composition root: loads configuration, sets up logging, builds a
//! [`Simulation`] from a scenario and runs it headless for a fixed number of
//! ticks. The final observation is printed to stdout as JSON.
//!
//! # Examples
//!
//! ```bash
//! # Built-in demo scenario, deterministic mock advisor
//! KINGDOM_PROVIDER=mock cargo run -p kingdom-client -- --ticks 600
//!
//! # Custom scenario and journal file
//! cargo run -p kingdom-client -- --scenario keep.toml --journal runs/keep.jsonl
//! ```
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use kingdom_runtime::{DecisionJournal, RuntimeConfig, Scenario, Simulation, logging};

#[derive(Parser, Debug)]
#[command(name = "kingdom", version, about = "Headless kingdom agent simulation")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario file; the built-in demo when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: u64,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Append decision records to this JSON lines file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Also write logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let _guard = logging::init(args.log_dir.as_deref())?;

    // 1. Configuration: defaults, file, environment, then flags
    let mut config = RuntimeConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }

    // 2. Scenario
    let scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Scenario::demo(),
    };
    tracing::info!(scenario = %scenario.name, seed = config.sim.seed, "starting kingdom");

    // 3. Build
    let mut builder = Simulation::builder().config(config).scenario(scenario);
    if let Some(path) = &args.journal {
        builder = builder.journal(DecisionJournal::to_file(path)?);
    }
    let mut sim = builder.build()?;

    // 4. Run
    let reports = sim.run(args.ticks).await?;
    let decisions: usize = reports.iter().map(|report| report.decisions).sum();
    let payouts: usize = reports.iter().map(|report| report.payouts.len()).sum();
    let errors: usize = reports.iter().map(|report| report.errors).sum();
    let stats = sim.brain_stats();
    tracing::info!(
        ticks = args.ticks,
        decisions,
        payouts,
        errors,
        consults = stats.consults,
        fallbacks = stats.fallbacks,
        digest = %sim.journal().digest(),
        "run complete"
    );

    println!("{}", serde_json::to_string_pretty(&sim.observe())?);
    Ok(())
}
