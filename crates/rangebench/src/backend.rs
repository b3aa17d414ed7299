//! The seam between workers and the query service being benchmarked.
//!
//! A [`Connector`] opens one [`QueryBackend`] session per worker. Sessions are
//! owned exclusively by their worker and never shared or pooled.

use crate::request::RangeQuery;
use core::future::Future;

/// Type-erased error returned by backend implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The pair of summary values a range query returns.
///
/// The harness only cares that the call succeeded; the values themselves are
/// opaque and `None` when the range held no samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RangeSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A connected session able to execute range queries.
pub trait QueryBackend: Send + 'static {
    /// Executes `query` and waits for its full result.
    fn execute_range_query(
        &mut self,
        query: &RangeQuery,
    ) -> impl Future<Output = Result<RangeSummary, BackendError>> + Send;
}

/// Opens backend sessions for workers.
pub trait Connector {
    type Backend: QueryBackend;

    /// Opens the session owned by worker `worker_id`.
    fn connect(
        &self,
        worker_id: usize,
    ) -> impl Future<Output = Result<Self::Backend, BackendError>> + Send;
}
