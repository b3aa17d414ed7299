//! PostgreSQL implementation of the benchmark backend.
//!
//! Each worker gets its own [`PgConnection`]; connections are never pooled or
//! shared, so a worker's latency samples only ever include its own round
//! trips.

use rangebench::{BackendError, Connector, QueryBackend, RangeQuery, RangeSummary};
use sqlx::{
    Connection,
    postgres::{PgConnectOptions, PgConnection},
};

/// Summarises one host's CPU usage over an inclusive time range.
pub const RANGE_QUERY: &str = "SELECT min(usage)::float8, max(usage)::float8 \
     FROM cpu_usage \
     WHERE host = $1 AND ts >= $2 AND ts <= $3";

/// Opens one connection per worker from a shared set of options.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub const fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// Opens a single connection and checks that it answers. Used by the data
    /// loader, which bypasses the worker pool.
    pub async fn connect_one(&self) -> Result<PgConnection, sqlx::Error> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        // Warm the connection up so the first measured query does not pay
        // for it.
        conn.ping().await?;
        Ok(conn)
    }
}

impl Connector for PgConnector {
    type Backend = PgBackend;

    async fn connect(&self, _worker_id: usize) -> Result<PgBackend, BackendError> {
        let conn = self.connect_one().await?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {_worker_id} connected");

        Ok(PgBackend { conn })
    }
}

/// A worker's exclusive database session.
pub struct PgBackend {
    conn: PgConnection,
}

impl QueryBackend for PgBackend {
    async fn execute_range_query(
        &mut self,
        query: &RangeQuery,
    ) -> Result<RangeSummary, BackendError> {
        let (min, max): (Option<f64>, Option<f64>) = sqlx::query_as(RANGE_QUERY)
            .bind(&query.key)
            .bind(query.range_start)
            .bind(query.range_end)
            .fetch_one(&mut self.conn)
            .await?;

        Ok(RangeSummary { min, max })
    }
}
