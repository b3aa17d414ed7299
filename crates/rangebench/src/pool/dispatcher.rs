use super::assignment::AssignmentTable;
use crate::{
    error::{Error, Result},
    request::RangeQuery,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Routes requests from the source onto the workers' inbound queues.
///
/// Each request goes to the worker its key is pinned to by the
/// [`AssignmentTable`]. Queues are bounded, so a push waits while the target
/// worker is busy; requests are never dropped or reordered.
pub struct Dispatcher {
    table: AssignmentTable,
    workers: Vec<mpsc::Sender<RangeQuery>>,
    abort: CancellationToken,
    dispatched: u64,
}

impl Dispatcher {
    /// Constructs a dispatcher over the workers' inbound senders.
    ///
    /// `table` must have been built for `workers.len()` workers.
    pub fn new(
        table: AssignmentTable,
        workers: Vec<mpsc::Sender<RangeQuery>>,
        abort: CancellationToken,
    ) -> Self {
        debug_assert_eq!(table.worker_count().get(), workers.len());
        Self {
            table,
            workers,
            abort,
            dispatched: 0,
        }
    }

    /// Consumes `source` to exhaustion, in order, and returns the number of
    /// requests dispatched by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source yields an error. Dispatch stops at that record.
    /// - The run was aborted (`abort` was cancelled).
    /// - A worker's queue is closed.
    pub async fn dispatch<I>(&mut self, source: I) -> Result<u64>
    where
        I: IntoIterator<Item = Result<RangeQuery>>,
    {
        let before = self.dispatched;
        for item in source {
            let query = item?;
            let worker_idx = self.table.resolve(&query.key);
            self.send(worker_idx, query).await?;
        }
        Ok(self.dispatched - before)
    }

    async fn send(&mut self, worker_idx: usize, query: RangeQuery) -> Result<()> {
        let worker = &self.workers[worker_idx];

        let sent = tokio::select! {
            biased;
            () = self.abort.cancelled() => return Err(Error::RunAborted),
            res = worker.send(query) => res,
        };
        if sent.is_err() {
            return Err(Error::ChannelError {
                context: format!("Worker {worker_idx} inbound queue closed"),
            });
        }

        self.dispatched += 1;
        Ok(())
    }

    /// Total requests dispatched so far.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Closes every worker's inbound queue, signalling that no more work will
    /// arrive, and hands back the final assignment table.
    ///
    /// Each sender is dropped individually, so a worker wakes as soon as its
    /// own queue is closed and drained.
    pub fn close(self) -> AssignmentTable {
        for (_worker_idx, worker) in self.workers.into_iter().enumerate() {
            drop(worker);
            #[cfg(feature = "tracing")]
            tracing::trace!("Closed inbound queue of worker {_worker_idx}");
        }
        self.table
    }
}
