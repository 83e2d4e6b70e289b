//! Time-based matching between a surface series and the host time axis.

use crate::data_types::{Candle, Timeframe};
use crate::host::HostChart;
use std::ops::RangeInclusive;

/// Anything with a sorted list of bar open times.
pub trait TimeAxis {
    fn len(&self) -> usize;
    fn time_at(&self, index: usize) -> Option<i64>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimeAxis for [Candle] {
    fn len(&self) -> usize {
        <[Candle]>::len(self)
    }

    fn time_at(&self, index: usize) -> Option<i64> {
        self.get(index).map(|c| c.t)
    }
}

/// Host candles seen as a time axis.
pub struct HostAxis<'a>(pub &'a dyn HostChart);

impl TimeAxis for HostAxis<'_> {
    fn len(&self) -> usize {
        self.0.viewport().candle_count
    }

    fn time_at(&self, index: usize) -> Option<i64> {
        self.0.candle_time(index)
    }
}

/// Index in `range` whose time is closest to `t`. Ties go to the earlier bar.
pub fn nearest_index<A>(axis: &A, range: RangeInclusive<usize>, t: i64) -> Option<usize>
where
    A: TimeAxis + ?Sized,
{
    let (start, end) = (*range.start(), (*range.end()).min(axis.len().checked_sub(1)?));
    if start > end {
        return None;
    }

    // First index in range with time >= t.
    let (mut lo, mut hi) = (start, end + 1);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if axis.time_at(mid)? < t {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    let after = (lo <= end).then_some(lo);
    let before = (lo > start).then(|| lo - 1);
    match (before, after) {
        (Some(b), Some(a)) => {
            let db = t.abs_diff(axis.time_at(b)?);
            let da = t.abs_diff(axis.time_at(a)?);
            Some(if da < db { a } else { b })
        }
        (Some(b), None) => Some(b),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

/// Nearest bar to `t`, rejected when it is more than half a bar away.
pub fn align_time<A>(
    axis: &A,
    range: RangeInclusive<usize>,
    t: i64,
    timeframe: Timeframe,
) -> Option<usize>
where
    A: TimeAxis + ?Sized,
{
    let index = nearest_index(axis, range, t)?;
    let delta = t.abs_diff(axis.time_at(index)?);
    (delta <= timeframe.duration_ms().unsigned_abs() / 2).then_some(index)
}

/// Time at a fractional index. Positions past either end are extrapolated
/// one bar duration per index.
pub fn index_to_time<A>(axis: &A, index: f64, timeframe: Timeframe) -> Option<f64>
where
    A: TimeAxis + ?Sized,
{
    let len = axis.len();
    if len == 0 || !index.is_finite() {
        return None;
    }
    let duration = timeframe.duration_ms() as f64;
    let last = (len - 1) as f64;

    if index <= 0.0 {
        return Some(axis.time_at(0)? as f64 + index * duration);
    }
    if index >= last {
        return Some(axis.time_at(len - 1)? as f64 + (index - last) * duration);
    }

    let i = index.floor() as usize;
    let frac = index - i as f64;
    let t0 = axis.time_at(i)? as f64;
    let t1 = axis.time_at(i + 1)? as f64;
    Some(t0 + (t1 - t0) * frac)
}

/// Inverse of [`index_to_time`].
pub fn time_to_index<A>(axis: &A, t: f64, timeframe: Timeframe) -> Option<f64>
where
    A: TimeAxis + ?Sized,
{
    let len = axis.len();
    if len == 0 || !t.is_finite() {
        return None;
    }
    let duration = timeframe.duration_ms() as f64;
    let first = axis.time_at(0)? as f64;
    let last_t = axis.time_at(len - 1)? as f64;

    if t <= first {
        return Some((t - first) / duration);
    }
    if t >= last_t {
        return Some((len - 1) as f64 + (t - last_t) / duration);
    }

    // Last index with time <= t.
    let (mut lo, mut hi) = (0usize, len - 1);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if axis.time_at(mid)? as f64 <= t {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let t0 = axis.time_at(lo)? as f64;
    let t1 = axis.time_at(lo + 1)? as f64;
    let frac = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    Some(lo as f64 + frac)
}
