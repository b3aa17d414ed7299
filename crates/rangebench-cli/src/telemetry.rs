//! # Logging
//!
//! Log events are emitted through `tracing` when the `tracing` feature is
//! enabled (the default). They go to **stderr** so that the report printed on
//! stdout can be piped or diffed on its own.
//!
//! The level defaults to `info` and can be overridden through `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=rangebench=debug rangebench --workers 8
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
