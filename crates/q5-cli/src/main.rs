//! Q5 CLI - run the region revenue query over TPC-H `.tbl` files
//!
//! ```text
//! q5 --r_name ASIA --start_date 1994-01-01 --end_date 1994-12-31 \
//!    --table_path ./tpch --result_path ./result.txt --threads 8
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use q5_core::{Error, JoinStrategy, QueryConfig, QueryEngine, load_catalog, write_results};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Region revenue over orders placed inside a date window (TPC-H Q5 core)
#[derive(Parser, Debug)]
#[command(name = "q5")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Region name labelling the result
    #[arg(long = "r_name", value_name = "NAME")]
    r_name: String,

    /// First order date included (YYYY-MM-DD)
    #[arg(long = "start_date", value_name = "DATE")]
    start_date: String,

    /// Last order date included (YYYY-MM-DD)
    #[arg(long = "end_date", value_name = "DATE")]
    end_date: String,

    /// Number of worker threads
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    threads: u64,

    /// Directory holding the `<table>.tbl` files
    #[arg(long = "table_path", value_name = "DIR")]
    table_path: PathBuf,

    /// File the result is written to
    #[arg(long = "result_path", value_name = "FILE")]
    result_path: PathBuf,

    /// How lineitems are matched to orders
    #[arg(long = "join_strategy", value_name = "STRATEGY", default_value = "hash-index")]
    join_strategy: JoinStrategy,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "q5=debug,q5_core=debug"
    } else {
        "q5=warn,q5_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let threads = usize::try_from(cli.threads)
        .map_err(|_| Error::config(format!("--threads {} is too large", cli.threads)))?;
    let config = QueryConfig::new(cli.r_name, cli.start_date, cli.end_date)
        .with_threads(threads)
        .with_join_strategy(cli.join_strategy);
    config.validate()?;

    let catalog = load_catalog(&cli.table_path)
        .with_context(|| format!("failed to load tables from {}", cli.table_path.display()))?;

    let outcome = QueryEngine::new(&catalog.orders, &catalog.lineitem)
        .execute(&config)
        .context("query failed")?;
    info!(
        region = %config.region_name,
        revenue = outcome.results.get(&config.region_name).copied().unwrap_or_default(),
        workers = outcome.stats.workers_spawned,
        elapsed_ms = outcome.stats.elapsed.as_millis() as u64,
        "query complete"
    );

    write_results(&cli.result_path, &outcome.results).with_context(|| {
        format!("failed to write results to {}", cli.result_path.display())
    })?;
    Ok(())
}

/// Exit status per failure kind: 2 configuration, 3 I/O, 4 data, 1 other
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(Error::Config(_)) => 2,
        Some(Error::Io { .. }) => 3,
        Some(Error::Data { .. } | Error::MissingColumn { .. }) => 4,
        Some(Error::Worker(_)) | None => 1,
    }
}
