//! Database utility functions.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::db::{DbError, DbResult};

/// Storage format for all timestamps. Fixed width, so text comparison orders correctly.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current datetime as string in SQLite format
pub fn current_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Format a datetime in SQLite format. Sub-second precision is dropped.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a datetime stored by [`format_timestamp`].
pub fn parse_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DbError::InvalidData {
            message: format!("Malformed timestamp '{}': {}", raw, e),
            help: format!("Timestamps are stored as {}", TIMESTAMP_FORMAT),
        })
}

/// Truncate a datetime to the precision the database keeps.
pub fn storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(0)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_roundtrips_at_second_precision() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let formatted = format_timestamp(&at);
        assert_eq!(formatted, "2025-03-14 15:09:26");
        assert_eq!(parse_timestamp(&formatted).unwrap(), at);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DbError::InvalidData { .. })
        ));
    }

    #[test]
    fn storage_precision_drops_subseconds() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(
            storage_precision(at),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap()
        );
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
