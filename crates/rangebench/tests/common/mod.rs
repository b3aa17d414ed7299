#![allow(dead_code)]

use rangebench::{
    BackendError, Connector, QueryBackend, RangeQuery, RangeSummary, Result, parse_timestamp,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

/// One executed request, as seen by the fake backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub worker_id: usize,
    pub key: String,
    pub range_start: String,
}

/// In-memory stand-in for the time-series store.
///
/// Every session appends what it executed to a shared log, so tests can check
/// which worker handled which request and in what order.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub log: Arc<Mutex<Vec<Observation>>>,
    pub latency: HashMap<String, Duration>,
    pub fail_key: Option<String>,
    pub fail_connect: Option<usize>,
}

impl FakeConnector {
    pub fn observations(&self) -> Vec<Observation> {
        self.log.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    worker_id: usize,
    log: Arc<Mutex<Vec<Observation>>>,
    latency: HashMap<String, Duration>,
    fail_key: Option<String>,
}

impl Connector for FakeConnector {
    type Backend = FakeSession;

    async fn connect(&self, worker_id: usize) -> core::result::Result<FakeSession, BackendError> {
        if self.fail_connect == Some(worker_id) {
            return Err("connection refused".into());
        }
        Ok(FakeSession {
            worker_id,
            log: Arc::clone(&self.log),
            latency: self.latency.clone(),
            fail_key: self.fail_key.clone(),
        })
    }
}

impl QueryBackend for FakeSession {
    async fn execute_range_query(
        &mut self,
        query: &RangeQuery,
    ) -> core::result::Result<RangeSummary, BackendError> {
        if let Some(delay) = self.latency.get(&query.key) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_key.as_deref() == Some(query.key.as_str()) {
            return Err(format!("relation \"cpu_usage\" has no host {}", query.key).into());
        }
        self.log.lock().unwrap().push(Observation {
            worker_id: self.worker_id,
            key: query.key.clone(),
            range_start: query.range_start.to_string(),
        });
        Ok(RangeSummary {
            min: Some(0.0),
            max: Some(100.0),
        })
    }
}

pub const HEADER: &str = "hostname,start_time,end_time\n";

/// Builds a query CSV from `(host, start, end)` rows.
pub fn csv(rows: &[(&str, &str, &str)]) -> String {
    let mut out = String::from(HEADER);
    for (host, start, end) in rows {
        out.push_str(&format!("{host},{start},{end}\n"));
    }
    out
}

pub fn query(key: &str, start: &str, end: &str) -> Result<RangeQuery> {
    Ok(RangeQuery::new(
        key,
        parse_timestamp(start).unwrap(),
        parse_timestamp(end).unwrap(),
    ))
}

/// `count` rows over `keys` distinct hosts, each with a distinct start time so
/// per-key order can be checked.
pub fn rows(count: usize, keys: usize) -> Vec<Result<RangeQuery>> {
    (0..count)
        .map(|i| {
            let start = format!("2017-01-01 {:02}:{:02}:00", (i / 60) % 24, i % 60);
            query(&format!("host_{:06}", i % keys), &start, "2017-01-02 00:00:00")
        })
        .collect()
}
