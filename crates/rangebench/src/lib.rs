#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod backend;
pub mod bench;
mod error;
pub mod pool;
pub mod request;
pub mod source;
pub mod stats;

pub use crate::aggregate::{AggregateReport, Aggregator};
pub use crate::backend::{BackendError, Connector, QueryBackend, RangeSummary};
pub use crate::bench::{BenchConfig, run};
pub use crate::error::*;
pub use crate::pool::{assignment::AssignmentTable, dispatcher::Dispatcher, worker::WorkerRecord};
pub use crate::request::{RangeQuery, TIMESTAMP_FORMAT, parse_timestamp};
pub use crate::source::CsvRequestSource;
pub use crate::stats::Summary;
