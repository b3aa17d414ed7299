use crate::{
    backend::QueryBackend,
    error::{Error, Result},
    request::RangeQuery,
};
use core::time::Duration;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Latencies measured by one worker over the whole run.
///
/// Owned by the worker while it runs and moved to the aggregator exactly once
/// when its inbound queue closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerRecord {
    pub worker_id: usize,
    pub queries_executed: u64,
    pub total_execution_time: Duration,
    pub execution_times: Vec<Duration>,
}

impl WorkerRecord {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }

    /// Accounts for one completed query.
    pub fn record(&mut self, elapsed: Duration) {
        self.queries_executed += 1;
        self.total_execution_time += elapsed;
        self.execution_times.push(elapsed);
    }
}

/// Worker task that executes [`RangeQuery`]s against its own backend session.
///
/// Requests are pulled from `rx` and executed strictly one at a time, in
/// queue order. Only the backend call is timed; time spent waiting on the
/// queue is not.
///
/// The loop ends when:
///
/// - `rx` is closed and drained: the accumulated [`WorkerRecord`] is returned.
/// - A query fails: `abort` is cancelled so the rest of the run stops, and
///   [`Error::Backend`] is returned.
/// - `abort` is cancelled by someone else while waiting for work:
///   [`Error::RunAborted`] is returned.
///
/// # Arguments
///
/// - `worker_id`: Index of this worker, used for the record and logs.
/// - `rx`: The worker's dedicated inbound queue.
/// - `backend`: Connected session owned exclusively by this worker.
/// - `abort`: Run-wide abort signal, shared with the dispatcher and the other
///   workers.
pub async fn worker_loop<B: QueryBackend>(
    worker_id: usize,
    mut rx: mpsc::Receiver<RangeQuery>,
    mut backend: B,
    abort: CancellationToken,
) -> Result<WorkerRecord> {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    let mut record = WorkerRecord::new(worker_id);

    loop {
        let query = tokio::select! {
            biased;
            () = abort.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} aborted after {} queries", record.queries_executed);
                return Err(Error::RunAborted);
            }
            query = rx.recv() => query,
        };
        let Some(query) = query else {
            break;
        };

        let start = Instant::now();
        let result = backend.execute_range_query(&query).await;
        let elapsed = start.elapsed();

        if let Err(source) = result {
            #[cfg(feature = "tracing")]
            tracing::error!("Worker {worker_id} query for `{}` failed: {source}", query.key);
            abort.cancel();
            return Err(Error::Backend {
                worker_id,
                key: query.key,
                source,
            });
        }

        record.record(elapsed);
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        "Worker {worker_id} stopped after {} queries",
        record.queries_executed
    );

    Ok(record)
}

/// Spawns [`worker_loop`] on the runtime and returns the worker's outbound
/// channel.
///
/// The channel carries exactly one message: the worker's final record or the
/// error that stopped it. If the task panics the sender is dropped and the
/// receiver observes a closed channel instead.
pub fn spawn_worker<B: QueryBackend>(
    worker_id: usize,
    rx: mpsc::Receiver<RangeQuery>,
    backend: B,
    abort: CancellationToken,
) -> oneshot::Receiver<Result<WorkerRecord>> {
    let (tx, outbound) = oneshot::channel();

    tokio::spawn(async move {
        let result = worker_loop(worker_id, rx, backend, abort).await;
        if tx.send(result).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker {worker_id} finished but nobody is waiting for its record");
        }
    });

    outbound
}
