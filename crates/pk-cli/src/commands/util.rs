//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Formats a timestamp for tables and receipts.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn format_time_is_utc_with_seconds() {
        let at = Utc.with_ymd_and_hms(2025, 1, 30, 9, 5, 7).unwrap();
        assert_eq!(format_time(at), "2025-01-30 09:05:07 UTC");
    }

    #[test]
    fn write_json_appends_newline() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &[1, 2]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "[\n  1,\n  2\n]\n");
    }
}
