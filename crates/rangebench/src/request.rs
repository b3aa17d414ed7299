use chrono::NaiveDateTime;

/// Timestamp layout shared by the query parameter and usage CSVs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single range query: summarise `key`'s samples in `[range_start,
/// range_end]`.
///
/// Produced once per input row and consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeQuery {
    pub key: String,
    pub range_start: NaiveDateTime,
    pub range_end: NaiveDateTime,
}

impl RangeQuery {
    pub fn new(key: impl Into<String>, range_start: NaiveDateTime, range_end: NaiveDateTime) -> Self {
        Self {
            key: key.into(),
            range_start,
            range_end,
        }
    }
}

/// Parses a timestamp in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_date_time_layout() {
        let ts = parse_timestamp("2017-01-01 08:59:22").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2017, 1, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (8, 59, 22));
    }

    #[test]
    fn rejects_other_layouts() {
        assert!(parse_timestamp("2017-01-01T08:59:22").is_err());
        assert!(parse_timestamp("2017-01-01").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
