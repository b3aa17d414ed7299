use anyhow::{Context, bail};
use clap::Parser;
use rangebench::BenchConfig;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;

/// Largest batch that fits PostgreSQL's 65535 bind-parameter limit with three
/// columns per row.
pub const MAX_BATCH_SIZE: usize = u16::MAX as usize / 3;

/// Runtime configuration for the `rangebench` binary.
///
/// Every value can come from a CLI flag or an environment variable (a `.env`
/// file is loaded first), with defaults that match the bundled docker setup.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rangebench",
    version,
    about = "Replays host/time-range queries against PostgreSQL and reports latency percentiles"
)]
pub struct CliArgs {
    /// Query parameter CSV (`hostname,start_time,end_time`).
    ///
    /// Environment variable: `QUERY_FILE`
    #[arg(long, env = "QUERY_FILE", default_value = "input/query_params.csv")]
    pub file: PathBuf,

    /// Read the query parameter CSV from stdin instead of `--file`.
    #[arg(long, default_value_t = false)]
    pub stdin: bool,

    /// Number of workers. Each owns one database connection and every
    /// hostname is pinned to exactly one worker.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 1, allow_negative_numbers = true)]
    pub workers: i64,

    /// Capacity of each worker's inbound queue. Lower values apply
    /// backpressure to the reader sooner.
    ///
    /// Environment variable: `QUEUE_DEPTH`
    #[arg(long, env = "QUEUE_DEPTH", default_value_t = 1)]
    pub queue_depth: usize,

    /// Load the usage data set into the database and exit, skipping the
    /// benchmark.
    #[arg(long, default_value_t = false)]
    pub add_data: bool,

    /// Usage CSV (`ts,host,usage`) loaded by `--add-data`.
    ///
    /// Environment variable: `DATA_FILE`
    #[arg(long, env = "DATA_FILE", default_value = "input/cpu_usage.csv")]
    pub data_file: PathBuf,

    /// Rows per INSERT statement when loading data.
    ///
    /// Environment variable: `BATCH_SIZE`
    #[arg(long, env = "BATCH_SIZE", default_value_t = 10_000)]
    pub batch_size: usize,

    /// Environment variable: `DB_HOST`
    #[arg(long, env = "DB_HOST", default_value_t = String::from("db"))]
    pub db_host: String,

    /// Environment variable: `DB_PORT`
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Environment variable: `DB_USER`
    #[arg(long, env = "DB_USER", default_value_t = String::from("postgres"))]
    pub db_user: String,

    /// Environment variable: `DB_PASSWORD`
    #[arg(long, env = "DB_PASSWORD", default_value_t = String::from("password"), hide_default_value = true)]
    pub db_password: String,

    /// Environment variable: `DB_NAME`
    #[arg(long, env = "DB_NAME", default_value_t = String::from("homework"))]
    pub db_name: String,

    /// One of `disable`, `allow`, `prefer`, `require`, `verify-ca`,
    /// `verify-full`.
    ///
    /// Environment variable: `DB_SSL_MODE`
    #[arg(long, env = "DB_SSL_MODE", default_value_t = String::from("disable"))]
    pub db_ssl_mode: String,
}

/// Where the query parameters are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    File(PathBuf),
    Stdin,
}

/// What the binary does this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Benchmark {
        bench: BenchConfig,
        input: QueryInput,
    },
    Load {
        data_file: PathBuf,
        batch_size: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub connect: PgConnectOptions,
}

impl TryFrom<CliArgs> for Settings {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let ssl_mode: PgSslMode = args
            .db_ssl_mode
            .parse()
            .with_context(|| format!("invalid DB_SSL_MODE `{}`", args.db_ssl_mode))?;

        let connect = PgConnectOptions::new()
            .host(&args.db_host)
            .port(args.db_port)
            .username(&args.db_user)
            .password(&args.db_password)
            .database(&args.db_name)
            .ssl_mode(ssl_mode);

        let mode = if args.add_data {
            if args.batch_size == 0 {
                bail!("BATCH_SIZE must be greater than 0");
            }
            if args.batch_size > MAX_BATCH_SIZE {
                bail!(
                    "BATCH_SIZE ({}) exceeds the PostgreSQL bind parameter limit (max = {})",
                    args.batch_size,
                    MAX_BATCH_SIZE
                );
            }
            Mode::Load {
                data_file: args.data_file,
                batch_size: args.batch_size,
            }
        } else {
            let input = if args.stdin {
                QueryInput::Stdin
            } else {
                QueryInput::File(args.file)
            };
            Mode::Benchmark {
                bench: BenchConfig::new(args.workers, args.queue_depth)?,
                input,
            }
        };

        Ok(Self { mode, connect })
    }
}
