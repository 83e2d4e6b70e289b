mod common;

use common::{minute_candles, FakeHost, MINUTE, START};
use gpui_chart_overlays::alignment::{align_time, index_to_time, nearest_index, time_to_index, HostAxis};
use gpui_chart_overlays::{Candle, Timeframe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_nearest_index_prefers_earlier_on_tie() {
    let candles = minute_candles(START, 10, 1.0);
    let axis: &[Candle] = &candles;
    assert_eq!(nearest_index(axis, 0..=9, START + MINUTE / 2), Some(0));
    assert_eq!(nearest_index(axis, 0..=9, START + MINUTE / 2 + 1), Some(1));
    assert_eq!(nearest_index(axis, 0..=9, START - 10 * MINUTE), Some(0));
    assert_eq!(nearest_index(axis, 3..=100, START + 100 * MINUTE), Some(9));
    assert_eq!(nearest_index(axis, 5..=2, START), None);
}

#[test]
fn test_alignment_tolerance_is_half_a_bar() {
    let host = FakeHost::eurusd();
    let axis = HostAxis(&host);
    let tf = Timeframe::M1;

    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..1_000 {
        let t = START + rng.random_range(-10 * MINUTE..510 * MINUTE);
        match align_time(&axis, 0..=499, t, tf) {
            Some(i) => {
                let host_t = START + i as i64 * MINUTE;
                assert!((host_t - t).abs() <= MINUTE / 2);
            }
            None => {
                // Nothing on the host axis is close enough.
                let nearest = (t - START).div_euclid(MINUTE).clamp(0, 499);
                let gap = (0..=1)
                    .map(|k| (START + (nearest + k).min(499) * MINUTE - t).abs())
                    .min()
                    .unwrap_or(i64::MAX);
                assert!(gap > MINUTE / 2, "t {t} should have aligned");
            }
        }
    }
}

#[test]
fn test_alignment_respects_window() {
    let host = FakeHost::eurusd();
    let axis = HostAxis(&host);
    assert_eq!(align_time(&axis, 400..=499, START + 10 * MINUTE, Timeframe::M1), None);
    assert_eq!(align_time(&axis, 400..=499, START + 450 * MINUTE, Timeframe::M1), Some(450));
}

#[test]
fn test_fractional_index_time_round_trip() {
    let candles = minute_candles(START, 50, 1.0);
    let axis: &[Candle] = &candles;
    for index in [-3.5, 0.0, 0.25, 17.75, 49.0, 55.5] {
        let t = index_to_time(axis, index, Timeframe::M1).unwrap_or(f64::NAN);
        let back = time_to_index(axis, t, Timeframe::M1).unwrap_or(f64::NAN);
        assert!((back - index).abs() < 1e-9, "{index} came back as {back}");
    }
    assert_eq!(index_to_time(axis, 2.5, Timeframe::M1), Some((START + 150_000) as f64));
}

#[test]
fn test_empty_axis_has_no_times() {
    let axis: &[Candle] = &[];
    assert_eq!(index_to_time(axis, 1.0, Timeframe::M1), None);
    assert_eq!(time_to_index(axis, 1.0, Timeframe::M1), None);
    assert_eq!(nearest_index(axis, 0..=3, 0), None);
}
