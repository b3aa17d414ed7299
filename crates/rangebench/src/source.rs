//! CSV request source.
//!
//! The input is a header row followed by `hostname,start_time,end_time`
//! records. Records are produced lazily, one per [`Iterator::next`] call, so a
//! malformed row surfaces exactly when the dispatcher reaches it.

use crate::{
    error::{Error, Result},
    request::{RangeQuery, parse_timestamp},
};
use std::io::Read;

/// First field of the query parameter header row.
pub const QUERY_HEADER: &str = "hostname";

/// Lazily parses [`RangeQuery`] records from CSV.
pub struct CsvRequestSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    done: bool,
}

impl<R: Read> CsvRequestSource<R> {
    /// Wraps `reader` and validates the header row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] if the input is empty and
    /// [`Error::InvalidHeader`] if the first field of the first row is not
    /// `hostname`.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);
        let mut record = csv::StringRecord::new();

        check_header(&mut reader, &mut record, QUERY_HEADER)?;

        Ok(Self {
            reader,
            record,
            done: false,
        })
    }

    fn parse_record(&self) -> Result<RangeQuery> {
        let line = self.record.position().map_or(0, csv::Position::line);
        let field = |idx: usize| {
            self.record.get(idx).ok_or_else(|| Error::Parse {
                line,
                reason: format!("missing field {idx}"),
            })
        };
        let timestamp = |idx: usize| {
            let raw = field(idx)?;
            parse_timestamp(raw).map_err(|e| Error::Parse {
                line,
                reason: format!("invalid timestamp `{raw}`: {e}"),
            })
        };

        Ok(RangeQuery::new(field(0)?, timestamp(1)?, timestamp(2)?))
    }
}

impl<R: Read> Iterator for CsvRequestSource<R> {
    type Item = Result<RangeQuery>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.reader.read_record(&mut self.record) {
            Ok(true) => self.parse_record(),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(Error::from_csv(&e)),
        };
        // The source is not restartable: the first error ends the sequence.
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

/// Reads the first row of `reader` and checks that its first field equals
/// `expected`.
pub fn check_header<R: Read>(
    reader: &mut csv::Reader<R>,
    record: &mut csv::StringRecord,
    expected: &'static str,
) -> Result<()> {
    match reader.read_record(record) {
        Ok(true) => {}
        Ok(false) => return Err(Error::MissingHeader),
        Err(e) => return Err(Error::from_csv(&e)),
    }
    match record.get(0) {
        Some(first) if first == expected => Ok(()),
        found => Err(Error::InvalidHeader {
            expected,
            found: found.unwrap_or_default().to_string(),
        }),
    }
}
