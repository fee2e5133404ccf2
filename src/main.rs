//! Command-line entry point for a reconciliation run.
//!
//! Reads the internal ledger and custody exports, pairs them per event
//! and account, runs the staged analysis over every event and prints
//! the ranked break report to stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use divrecon::config::{self, RunConfig};
use divrecon::ingest::read_table;
use divrecon::oracle::{OllamaOracle, OracleConfig};
use divrecon::pipeline::PipelineRunner;
use divrecon::recon::{aggregate, annotate_event, normalize_custody, normalize_internal};
use divrecon::report;

#[derive(Parser)]
#[command(name = config::APP_NAME, version)]
#[command(about = "Reconcile dividend bookings between a ledger and a custody statement")]
struct Args {
    /// Internal ledger export (semicolon-separated)
    #[arg(long)]
    internal: PathBuf,

    /// Custody statement export (semicolon-separated)
    #[arg(long)]
    custody: PathBuf,

    /// Field delimiter used by both input files
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Analysis endpoint, overrides DIVRECON_ORACLE_URL
    #[arg(long)]
    oracle_url: Option<String>,

    /// Model for evidence, conclusion and priority stages,
    /// overrides DIVRECON_ORACLE_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Model for the critic stage, overrides DIVRECON_CRITIC_MODEL
    #[arg(long)]
    critic_model: Option<String>,

    /// Critic rounds per event before the last report is accepted as-is
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Events analyzed concurrently
    #[arg(long)]
    parallelism: Option<usize>,

    /// Wall-clock budget per event, in seconds
    #[arg(long)]
    event_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    divrecon::init_logging();
    let args = Args::parse();

    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .context("delimiter must be a single ASCII character")?;

    let internal_table = read_table(&args.internal, delimiter)
        .with_context(|| format!("reading internal export {}", args.internal.display()))?;
    let custody_table = read_table(&args.custody, delimiter)
        .with_context(|| format!("reading custody export {}", args.custody.display()))?;

    let mut rows = normalize_internal(&internal_table);
    rows.extend(normalize_custody(&custody_table));

    let aggregation = aggregate(rows);
    let mut events = aggregation.events;
    for event in &mut events {
        annotate_event(event);
    }

    let mut oracle_config = OracleConfig::from_env();
    if let Some(url) = args.oracle_url {
        oracle_config.base_url = url;
    }
    if let Some(model) = args.model {
        oracle_config.model = model;
    }
    if let Some(model) = args.critic_model {
        oracle_config.critic_model = model;
    }

    let mut run_config = RunConfig::default();
    if let Some(rounds) = args.max_iterations {
        run_config.max_critic_iterations = rounds;
    }
    if let Some(parallelism) = args.parallelism {
        run_config.parallelism = parallelism;
    }
    if let Some(secs) = args.event_timeout_secs {
        run_config.event_timeout = Duration::from_secs(secs);
    }

    let oracle = Arc::new(OllamaOracle::new(oracle_config));
    let runner = PipelineRunner::new(oracle, run_config);
    let summary = runner.run(events).await;

    print!("{}", report::render(&summary.breaks));

    if !summary.failed.is_empty() {
        tracing::warn!(
            failed = summary.failed.len(),
            examined = summary.events_examined,
            "Run completed with unanalyzed events"
        );
    }

    Ok(())
}
