#![doc = include_str!("../README.md")]

mod config;
mod load;
mod postgres;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, Mode, QueryInput, Settings};
use postgres::PgConnector;
use rangebench::{BenchConfig, CsvRequestSource};
use std::{fs::File, io::BufReader, path::Path};
use telemetry::init_telemetry;

// Using mimalloc to keep allocator contention out of the latency numbers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let settings = Settings::try_from(args)?;

    init_telemetry()?;

    let connector = PgConnector::new(settings.connect);
    match settings.mode {
        Mode::Benchmark { bench, input } => run_benchmark(&bench, &connector, input).await,
        Mode::Load {
            data_file,
            batch_size,
        } => run_load(&connector, &data_file, batch_size).await,
    }
}

async fn run_benchmark(
    bench: &BenchConfig,
    connector: &PgConnector,
    input: QueryInput,
) -> anyhow::Result<()> {
    let report = match input {
        QueryInput::Stdin => {
            let source = CsvRequestSource::new(std::io::stdin().lock())
                .context("error reading query parameters from stdin")?;
            rangebench::run(bench, connector, source).await?
        }
        QueryInput::File(path) => {
            let file = File::open(&path)
                .with_context(|| format!("unable to open input file {}", path.display()))?;
            let source = CsvRequestSource::new(BufReader::new(file))
                .with_context(|| format!("error reading input file {}", path.display()))?;
            rangebench::run(bench, connector, source).await?
        }
    };

    print!("{report}");
    Ok(())
}

async fn run_load(connector: &PgConnector, data_file: &Path, batch_size: usize) -> anyhow::Result<()> {
    let file = File::open(data_file)
        .with_context(|| format!("unable to open data file {}", data_file.display()))?;
    let rows = load::read_usage(BufReader::new(file))
        .with_context(|| format!("error reading data file {}", data_file.display()))?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Loading {} rows from {} in batches of {batch_size}",
        rows.len(),
        data_file.display()
    );

    let mut conn = connector
        .connect_one()
        .await
        .context("unable to connect to the database, check the DB_* settings")?;
    let loaded = load::load_usage(&mut conn, &rows, batch_size).await?;

    println!("Loaded {loaded} rows into cpu_usage");
    Ok(())
}
