//! Fan-in of per-worker records into the final report.
//!
//! Records are combined additively: query counts and execution times are
//! summed and latency samples are concatenated, so every worker contributes
//! to the result regardless of the order in which they are absorbed.

use crate::{
    error::{Error, Result},
    pool::worker::WorkerRecord,
    stats::Summary,
};
use core::{fmt, time::Duration};
use tokio::sync::oneshot;

/// Running combination of [`WorkerRecord`]s.
#[derive(Debug, Default)]
pub struct Aggregator {
    workers: usize,
    total_queries: u64,
    total_execution_time: Duration,
    execution_times: Vec<Duration>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one worker's record to the aggregate.
    pub fn absorb(&mut self, record: WorkerRecord) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Worker {} executed {} queries in {:?}",
            record.worker_id,
            record.queries_executed,
            record.total_execution_time
        );

        self.workers += 1;
        self.total_queries += record.queries_executed;
        self.total_execution_time += record.total_execution_time;
        self.execution_times.extend(record.execution_times);
    }

    /// Number of records absorbed so far.
    pub const fn workers(&self) -> usize {
        self.workers
    }

    pub const fn total_queries(&self) -> u64 {
        self.total_queries
    }

    /// Builds the final report, summarising all absorbed samples.
    pub fn finish(self, wall_clock_time: Duration) -> AggregateReport {
        let summary = Summary::from_durations(&self.execution_times);
        AggregateReport {
            total_queries: self.total_queries,
            total_execution_time: self.total_execution_time,
            execution_times: self.execution_times,
            wall_clock_time,
            summary,
        }
    }
}

/// Waits on every worker's outbound channel, in index order, and combines the
/// records.
///
/// Every channel is drained even after a failure, so no worker is left
/// blocked on its report. When workers fail, the error returned is the first
/// one (in index order) that is not [`Error::RunAborted`]; if every failure is
/// an abort, `RunAborted` is returned.
pub async fn collect(outbound: Vec<oneshot::Receiver<Result<WorkerRecord>>>) -> Result<Aggregator> {
    let mut aggregator = Aggregator::new();
    let mut failure: Option<Error> = None;

    for (worker_idx, rx) in outbound.into_iter().enumerate() {
        let result = rx.await.unwrap_or_else(|_| {
            Err(Error::ChannelError {
                context: format!("Worker {worker_idx} exited without reporting"),
            })
        });

        match result {
            Ok(record) => aggregator.absorb(record),
            Err(e) => {
                let keep_previous = failure
                    .as_ref()
                    .is_some_and(|prev| !prev.is_aborted() || e.is_aborted());
                if !keep_previous {
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(aggregator),
    }
}

/// Aggregate latency statistics for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub total_queries: u64,
    pub total_execution_time: Duration,
    pub execution_times: Vec<Duration>,
    pub wall_clock_time: Duration,
    /// `None` when no query was executed.
    pub summary: Option<Summary>,
}

const STAT_LABELS: [&str; 6] = [
    "Average Execution time :",
    "Min    :",
    "Median :",
    "P90    :",
    "P95    :",
    "Max    :",
];

fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Runtime : {} ms", self.wall_clock_time.as_millis())?;
        writeln!(f, "Total Queries: {}", self.total_queries)?;
        writeln!(
            f,
            "Total Query Execution time : {} ms",
            self.total_execution_time.as_millis()
        )?;

        match &self.summary {
            Some(s) => {
                let values = [s.mean, s.min, s.median, s.p90, s.p95, s.max];
                for (label, value) in STAT_LABELS.into_iter().zip(values) {
                    writeln!(f, "{label} {:.2} ms", as_millis_f64(value))?;
                }
            }
            None => {
                for label in STAT_LABELS {
                    writeln!(f, "{label} n/a")?;
                }
            }
        }
        Ok(())
    }
}
