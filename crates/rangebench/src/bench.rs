//! Run orchestration.
//!
//! A run goes through the following phases, all driven from the calling task:
//!
//! 1. Open one backend session per worker. Any failure ends the run before a
//!    single request is dispatched.
//! 2. Spawn the workers, each with its own inbound queue and outbound channel.
//! 3. Dispatch the whole source, then close every inbound queue.
//! 4. Collect the workers' records in index order and build the report.

use crate::{
    aggregate::{AggregateReport, collect},
    backend::Connector,
    error::{Error, Result},
    pool::{assignment::AssignmentTable, dispatcher::Dispatcher, worker::spawn_worker},
    request::RangeQuery,
};
use core::num::NonZeroUsize;
use futures::future::try_join_all;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Validated settings for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Number of workers, fixed for the whole run.
    pub num_workers: NonZeroUsize,
    /// Capacity of each worker's inbound queue.
    pub queue_depth: NonZeroUsize,
}

impl BenchConfig {
    /// Validates raw values coming from the configuration surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_workers` is not positive or
    /// `queue_depth` is zero.
    pub fn new(num_workers: i64, queue_depth: usize) -> Result<Self> {
        let num_workers = usize::try_from(num_workers)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| Error::InvalidConfig {
                reason: format!("workers must be a positive number, got {num_workers}"),
            })?;
        let queue_depth = NonZeroUsize::new(queue_depth).ok_or_else(|| Error::InvalidConfig {
            reason: "queue depth must be greater than 0".to_string(),
        })?;

        Ok(Self {
            num_workers,
            queue_depth,
        })
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            num_workers: NonZeroUsize::MIN,
            queue_depth: NonZeroUsize::MIN,
        }
    }
}

/// Replays `source` against backends opened by `connector` and returns the
/// aggregate latency report.
///
/// Wall-clock time is measured from the start of dispatch until every worker
/// has reported.
///
/// # Errors
///
/// Any failure aborts the whole run and no report is produced:
/// - [`Error::Connect`] if a worker's session cannot be opened.
/// - The source's own error (e.g. [`Error::Parse`]) if a record is malformed.
/// - [`Error::Backend`] if any query fails.
pub async fn run<C, S>(config: &BenchConfig, connector: &C, source: S) -> Result<AggregateReport>
where
    C: Connector,
    S: IntoIterator<Item = Result<RangeQuery>>,
{
    let num_workers = config.num_workers.get();

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Starting run with {num_workers} workers (queue depth {})",
        config.queue_depth
    );

    let backends = try_join_all((0..num_workers).map(|worker_id| async move {
        connector
            .connect(worker_id)
            .await
            .map_err(|source| Error::Connect { worker_id, source })
    }))
    .await?;

    let abort = CancellationToken::new();
    let mut inbound = Vec::with_capacity(num_workers);
    let mut outbound = Vec::with_capacity(num_workers);

    for (worker_id, backend) in backends.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel(config.queue_depth.get());
        inbound.push(tx);
        outbound.push(spawn_worker(worker_id, rx, backend, abort.clone()));
    }

    let started = Instant::now();
    let mut dispatcher = Dispatcher::new(
        AssignmentTable::new(config.num_workers),
        inbound,
        abort.clone(),
    );
    let dispatched = dispatcher.dispatch(source).await;
    if dispatched.is_err() {
        abort.cancel();
    }
    let _table = dispatcher.close();

    let collected = collect(outbound).await;
    let wall_clock_time = started.elapsed();

    let aggregator = match (dispatched, collected) {
        (Ok(_), Ok(aggregator)) => aggregator,
        // A worker failure that tripped the abort is more useful than the
        // dispatcher's secondary error.
        (Err(_), Err(e)) if !e.is_aborted() => return Err(e),
        (Err(e), _) | (Ok(_), Err(e)) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Run failed: {e}");
            return Err(e);
        }
    };

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Run finished: {} queries across {} keys in {:?}",
        aggregator.total_queries(),
        _table.len(),
        wall_clock_time
    );

    Ok(aggregator.finish(wall_clock_time))
}
