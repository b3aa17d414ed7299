//! Fixed-size pool of benchmark workers.
//!
//! Each worker listens on its own bounded [`tokio::sync::mpsc`] queue, fed by
//! a single [`Dispatcher`](dispatcher::Dispatcher), and reports its
//! [`WorkerRecord`](worker::WorkerRecord) over a dedicated oneshot channel.
//! Every queue has exactly one producer and one consumer.

pub mod assignment;
pub mod dispatcher;
pub mod worker;
