//! Bucketing of raw price history onto the host timeframe.

use crate::data_types::{Candle, Timeframe};
use tracing::debug;

/// Aggregates `raw` into fixed `timeframe` buckets.
///
/// Input order does not matter. Rows without four finite prices, or whose
/// bucket start overflows, are dropped; a non-finite volume counts as zero.
/// The output is strictly increasing in `t`, each `t` is a bucket start, and
/// running it again over its own output changes nothing.
pub fn resample(raw: &[Candle], timeframe: Timeframe) -> Vec<Candle> {
    let mut rows: Vec<Candle> = raw
        .iter()
        .filter(|c| c.is_valid())
        .map(normalize)
        .collect();

    // Stable, so bars sharing a timestamp keep their arrival order for open/close.
    rows.sort_by_key(|c| c.t);

    let mut out: Vec<Candle> = Vec::new();
    for row in rows {
        let Some(bucket) = timeframe.bucket_start(row.t) else {
            continue;
        };
        match out.last_mut() {
            Some(last) if last.t == bucket => {
                last.h = last.h.max(row.h);
                last.l = last.l.min(row.l);
                last.c = row.c;
                last.v += row.v;
            }
            _ => out.push(Candle { t: bucket, ..row }),
        }
    }

    debug!(
        raw = raw.len(),
        bars = out.len(),
        timeframe = %timeframe,
        "resampled series"
    );
    out
}

fn normalize(c: &Candle) -> Candle {
    let h = c.o.max(c.h).max(c.l).max(c.c);
    let l = c.o.min(c.h).min(c.l).min(c.c);
    let v = if c.v.is_finite() { c.v } else { 0.0 };
    Candle { h, l, v, ..*c }
}

/// Raw history of one surface plus its resampled view.
///
/// The raw rows are kept for the lifetime of the surface so a timeframe
/// change re-aggregates from the source instead of from already merged bars.
#[derive(Clone, Debug, Default)]
pub struct SeriesCache {
    raw: Vec<Candle>,
    resampled: Vec<Candle>,
    timeframe: Option<Timeframe>,
}

impl SeriesCache {
    pub fn new(raw: Vec<Candle>, timeframe: Timeframe) -> Self {
        let resampled = resample(&raw, timeframe);
        Self {
            raw,
            resampled,
            timeframe: Some(timeframe),
        }
    }

    /// Resamples again if `timeframe` differs from the current one. Returns
    /// whether anything was recomputed.
    pub fn ensure(&mut self, timeframe: Timeframe) -> bool {
        if self.timeframe == Some(timeframe) {
            return false;
        }
        self.resampled = resample(&self.raw, timeframe);
        self.timeframe = Some(timeframe);
        true
    }

    pub fn raw(&self) -> &[Candle] {
        &self.raw
    }

    pub fn candles(&self) -> &[Candle] {
        &self.resampled
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        self.timeframe
    }

    pub fn is_empty(&self) -> bool {
        self.resampled.is_empty()
    }
}
