mod common;

use common::{minute_candles, MINUTE, START};
use gpui_chart_overlays::resample::SeriesCache;
use gpui_chart_overlays::{resample, Candle, Timeframe};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_rows(rng: &mut StdRng, n: usize) -> Vec<Candle> {
    (0..n)
        .map(|_| {
            let t = START + rng.random_range(0..(3 * 24 * 60 * MINUTE));
            let o: f64 = rng.random_range(90.0..110.0);
            let c: f64 = rng.random_range(90.0..110.0);
            let h = o.max(c) + rng.random_range(0.0..2.0);
            let l = o.min(c) - rng.random_range(0.0..2.0);
            Candle::new(t, o, h, l, c, rng.random_range(0.0..1000.0))
        })
        .collect()
}

#[test]
fn test_resample_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    for tf in Timeframe::ALL {
        let raw = random_rows(&mut rng, 2_000);
        let once = resample(&raw, tf);
        let twice = resample(&once, tf);
        assert_eq!(once, twice, "timeframe {tf}");
    }
}

#[test]
fn test_resample_output_is_sorted_and_bucketed() {
    let mut rng = StdRng::seed_from_u64(11);
    let raw = random_rows(&mut rng, 5_000);
    for tf in Timeframe::ALL {
        let bars = resample(&raw, tf);
        assert!(bars.windows(2).all(|w| w[0].t < w[1].t));
        assert!(bars.iter().all(|b| b.t % tf.duration_ms() == 0));
        assert!(bars.iter().all(|b| b.l <= b.o.min(b.c) && b.h >= b.o.max(b.c)));
    }
}

#[test]
fn test_resample_ignores_input_order() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut raw = minute_candles(START, 600, 1.1);
    let sorted = resample(&raw, Timeframe::M15);
    raw.shuffle(&mut rng);
    assert_eq!(resample(&raw, Timeframe::M15), sorted);
}

#[test]
fn test_resample_bucket_boundaries() {
    let five = 5 * MINUTE;
    let raw = vec![
        Candle::new(START, 10.0, 12.0, 9.0, 11.0, 1.0),
        Candle::new(START + MINUTE, 11.0, 15.0, 10.0, 14.0, 2.0),
        Candle::new(START + 4 * MINUTE, 14.0, 14.5, 8.0, 13.0, 3.0),
        // First bar of the next bucket.
        Candle::new(START + 5 * MINUTE, 13.0, 13.0, 12.0, 12.5, 4.0),
    ];
    let bucket = START - START.rem_euclid(five);
    let bars = resample(&raw, Timeframe::M5);

    // START is minute aligned but not five-minute aligned.
    let expected_first = Timeframe::M5.bucket_start(START).unwrap();
    assert_eq!(bars[0].t, expected_first);
    assert_eq!(bucket, expected_first);

    let total_volume: f64 = bars.iter().map(|b| b.v).sum();
    assert_eq!(total_volume, 10.0);
    assert!(bars.iter().all(|b| b.t % five == 0));
    assert_eq!(bars.first().map(|b| b.o), Some(10.0));
    assert_eq!(bars.last().map(|b| b.c), Some(12.5));
}

#[test]
fn test_resample_merges_open_high_low_close() {
    let t = Timeframe::H1.bucket_start(START).unwrap();
    let raw = vec![
        Candle::new(t + 2 * MINUTE, 2.0, 6.0, 1.5, 5.0, 1.0),
        Candle::new(t, 1.0, 3.0, 0.5, 2.0, 1.0),
        Candle::new(t + 59 * MINUTE, 5.0, 5.5, 4.0, 4.5, 1.0),
    ];
    let bars = resample(&raw, Timeframe::H1);
    assert_eq!(bars, vec![Candle::new(t, 1.0, 6.0, 0.5, 4.5, 3.0)]);
}

#[test]
fn test_resample_drops_invalid_rows_and_fixes_extremes() {
    let raw = vec![
        Candle::new(START, f64::NAN, 1.0, 1.0, 1.0, 1.0),
        Candle::new(START + MINUTE, 1.0, f64::INFINITY, 1.0, 1.0, 1.0),
        // High below the close, low above the open.
        Candle::new(START + 2 * MINUTE, 1.0, 0.9, 1.1, 1.2, f64::NAN),
    ];
    let bars = resample(&raw, Timeframe::M1);
    assert_eq!(bars.len(), 1);
    let bar = bars[0];
    assert_eq!((bar.h, bar.l, bar.v), (1.2, 0.9, 0.0));
}

#[test]
fn test_resample_empty() {
    assert!(resample(&[], Timeframe::D1).is_empty());
}

#[test]
fn test_resample_extreme_timestamps() {
    let raw = vec![
        Candle::new(i64::MIN, 1.0, 1.0, 1.0, 1.0, 1.0),
        Candle::new(START, 2.0, 2.0, 2.0, 2.0, 1.0),
        Candle::new(i64::MAX, 3.0, 3.0, 3.0, 3.0, 1.0),
    ];
    for tf in Timeframe::ALL {
        let bars = resample(&raw, tf);
        // i64::MIN floors below the representable range and is dropped.
        assert_eq!(bars.len(), 2, "{tf}");
        assert_eq!(bars[0].c, 2.0);
        assert_eq!(bars[1].c, 3.0);
        assert!(i64::MAX - bars[1].t < tf.duration_ms());
        assert_eq!(resample(&bars, tf), bars);
    }
}

#[test]
fn test_series_cache_resamples_from_raw() {
    let raw = minute_candles(START, 120, 1.1);
    let mut cache = SeriesCache::new(raw.clone(), Timeframe::M1);
    assert_eq!(cache.candles().len(), 120);

    assert!(cache.ensure(Timeframe::M15));
    let m15 = cache.candles().len();
    assert!((8..=9).contains(&m15));

    // Going back down must use the raw rows, not the merged bars.
    assert!(cache.ensure(Timeframe::M1));
    assert_eq!(cache.candles().len(), 120);
    assert!(!cache.ensure(Timeframe::M1));
    assert_eq!(cache.raw(), raw.as_slice());
    assert_eq!(cache.timeframe(), Some(Timeframe::M1));
}
