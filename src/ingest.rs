//! Minimal parse step between a data source and the resampler.
//!
//! Column sniffing is deliberately shallow: the first five columns are
//! `time, open, high, low, close` and an optional sixth is volume.

use crate::data_types::{Candle, SourceRef};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// What a data source hands back for a [`SourceRef`].
#[derive(Clone, Debug, PartialEq)]
pub enum RawHistory {
    /// Delimited text, as read from a file or an HTTP body.
    Text(String),
    /// Already structured rows.
    Candles(Vec<Candle>),
}

impl RawHistory {
    pub fn into_candles(self) -> Vec<Candle> {
        match self {
            Self::Text(text) => parse_candles(&text),
            Self::Candles(candles) => candles,
        }
    }
}

/// External collaborator that fetches price history. The engine never talks
/// to the network itself.
pub trait CandleSource {
    fn fetch(&self, source: &SourceRef) -> eyre::Result<RawHistory>;
}

impl<F> CandleSource for F
where
    F: Fn(&SourceRef) -> eyre::Result<RawHistory>,
{
    fn fetch(&self, source: &SourceRef) -> eyre::Result<RawHistory> {
        self(source)
    }
}

/// Parses delimited OHLCV text. Unparseable rows (including a header) are
/// skipped, so garbage input yields an empty vector rather than an error.
pub fn parse_candles(text: &str) -> Vec<Candle> {
    let mut skipped = 0usize;
    let candles: Vec<Candle> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let row = parse_row(line);
            if row.is_none() {
                skipped += 1;
            }
            row
        })
        .collect();

    debug!(rows = candles.len(), skipped, "parsed candle text");
    candles
}

fn parse_row(line: &str) -> Option<Candle> {
    let delimiter = [',', ';', '\t']
        .into_iter()
        .find(|d| line.contains(*d))?;
    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    if fields.len() < 5 {
        return None;
    }

    let t = parse_time(fields[0])?;
    let o = fields[1].parse::<f64>().ok()?;
    let h = fields[2].parse::<f64>().ok()?;
    let l = fields[3].parse::<f64>().ok()?;
    let c = fields[4].parse::<f64>().ok()?;
    let v = fields
        .get(5)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    let candle = Candle::new(t, o, h, l, c, v);
    candle.is_valid().then_some(candle)
}

/// Epoch values below 1e11 are seconds, anything larger is milliseconds.
fn parse_time(field: &str) -> Option<i64> {
    if let Ok(value) = field.parse::<f64>() {
        if !value.is_finite() {
            return None;
        }
        let ms = if value.abs() < 1e11 {
            value * 1000.0
        } else {
            value
        };
        // The cast saturates; chrono rejects anything outside its calendar.
        return DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.timestamp_millis());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(field) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(field, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(field, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
