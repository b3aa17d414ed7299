//! One-shot provisioning of the `cpu_usage` table from a usage CSV.
//!
//! This path is independent of the benchmark: a single connection inserts the
//! rows in multi-row `INSERT` statements inside one transaction, so a failed
//! load leaves the table untouched.

use anyhow::Context;
use chrono::NaiveDateTime;
use rangebench::{Error, parse_timestamp, source::check_header};
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use std::io::Read;

/// First field of the usage CSV header row.
pub const USAGE_HEADER: &str = "ts";

/// A single `cpu_usage` sample.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    pub ts: NaiveDateTime,
    pub host: String,
    pub usage: f64,
}

impl UsageRow {
    fn parse(record: &csv::StringRecord) -> Result<Self, Error> {
        let line = record.position().map_or(0, csv::Position::line);
        let parse_err = |reason: String| Error::Parse { line, reason };
        let field = |idx: usize| {
            record
                .get(idx)
                .ok_or_else(|| parse_err(format!("missing field {idx}")))
        };

        let raw_ts = field(0)?;
        let ts = parse_timestamp(raw_ts)
            .map_err(|e| parse_err(format!("invalid timestamp `{raw_ts}`: {e}")))?;
        let raw_usage = field(2)?;
        let usage = raw_usage
            .trim()
            .parse::<f64>()
            .map_err(|e| parse_err(format!("invalid usage `{raw_usage}`: {e}")))?;

        Ok(Self {
            ts,
            host: field(1)?.to_string(),
            usage,
        })
    }
}

/// Reads every usage row from `reader`, checking the header first.
pub fn read_usage<R: Read>(reader: R) -> Result<Vec<UsageRow>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);
    let mut record = csv::StringRecord::new();
    check_header(&mut reader, &mut record, USAGE_HEADER)?;

    let mut rows = Vec::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => rows.push(UsageRow::parse(&record)?),
            Ok(false) => break,
            Err(e) => return Err(Error::from_csv(&e)),
        }
    }
    Ok(rows)
}

/// Builds the multi-row insert for one batch.
pub fn insert_statement(batch: &[UsageRow]) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO cpu_usage (ts, host, usage) ");
    builder.push_values(batch, |mut b, row| {
        b.push_bind(row.ts).push_bind(&row.host).push_bind(row.usage);
    });
    builder
}

/// Inserts `rows` in batches of `batch_size` and returns the number of rows
/// written.
pub async fn load_usage(
    conn: &mut PgConnection,
    rows: &[UsageRow],
    batch_size: usize,
) -> anyhow::Result<u64> {
    let mut tx = conn.begin().await.context("failed to begin transaction")?;
    let mut loaded = 0_u64;

    for (_batch_idx, batch) in rows.chunks(batch_size).enumerate() {
        let result = insert_statement(batch)
            .build()
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!(
                    "failed to insert rows {}..{}",
                    loaded,
                    loaded + batch.len() as u64
                )
            })?;
        loaded += result.rows_affected();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Inserted batch {_batch_idx} ({} rows, {loaded} total)",
            batch.len()
        );
    }

    tx.commit().await.context("failed to commit load")?;
    Ok(loaded)
}
