use crate::data_types::Timeframe;
use chrono::{TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartDateFormat {
    DayMonthYear, // 12 Jan 2024
    DayMonthTime, // 12 Jan 10:30
}

/// Picks the legend date format for bars of the given width.
pub fn format_for(timeframe: Timeframe) -> SmartDateFormat {
    match timeframe {
        Timeframe::D1 | Timeframe::W1 => SmartDateFormat::DayMonthYear,
        _ => SmartDateFormat::DayMonthTime,
    }
}

/// Formats a millisecond timestamp (UTC).
pub fn format_timestamp_ms(ms: i64, format: SmartDateFormat) -> String {
    let dt = match Utc.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(d) => d,
        chrono::LocalResult::Ambiguous(d, _) => d,
        chrono::LocalResult::None => return ms.to_string(),
    };

    match format {
        SmartDateFormat::DayMonthYear => dt.format("%d %b %Y").to_string(),
        SmartDateFormat::DayMonthTime => dt.format("%d %b %H:%M").to_string(),
    }
}
