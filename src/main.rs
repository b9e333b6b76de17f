use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use synaptome_lib::{run, RuleParams, RunOptions, TerritorialState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tissue config file path (built-in default when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rounds to run
    #[arg(short, long, default_value_t = 10)]
    rounds: u64,

    /// Worker threads (defaults to the available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for the initial tissue
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// One synapse in N starts migrating each round
    #[arg(long, default_value_t = 8)]
    migration_period: u64,

    /// Tissue kind to analyse after the last round
    #[arg(long)]
    histogram_kind: Option<u32>,

    /// Histogram bucket rows
    #[arg(long, default_value_t = 4)]
    histogram_rows: u32,

    /// Histogram bucket columns
    #[arg(long, default_value_t = 4)]
    histogram_cols: u32,

    /// Territorial state counted by the analysis (label or tag)
    #[arg(long, default_value = "signal-delivery")]
    filter: TerritorialState,
}

fn main() -> Result<()> {
    synaptome_core::init_logging();
    let args = Args::parse();

    let threads = args.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let options = RunOptions {
        config: args.config,
        rounds: args.rounds,
        threads,
        seed: args.seed,
        rules: RuleParams {
            migration_period: args.migration_period,
            ..RuleParams::default()
        },
        histogram_kind: args.histogram_kind,
        histogram_rows: args.histogram_rows,
        histogram_cols: args.histogram_cols,
        filter: args.filter,
    };

    let report = run(&options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
