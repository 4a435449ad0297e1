use chrono::{DateTime, Local, NaiveDateTime};

use crate::layout::TIME_DIFF;

/// Seconds east of UTC for the local timezone right now.
pub fn local_offset_seconds() -> i64 {
    Local::now().offset().local_minus_utc() as i64
}

/// Convert a volume timestamp to calendar fields.
///
/// The local offset is folded into the seconds count, so the breakdown itself
/// applies no further zone.
pub fn decode_timestamp(stored: u32, local_offset: i64) -> NaiveDateTime {
    let unix_seconds = stored as i64 - TIME_DIFF - local_offset;
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// `DD/MM/YYYY HH:MM:SS`
pub fn format_timestamp(stored: u32, local_offset: i64) -> String {
    decode_timestamp(stored, local_offset)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}
