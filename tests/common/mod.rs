#![allow(dead_code)]

use gpui::{point, px, size, Bounds, Pixels};
use gpui_chart_overlays::ingest::RawHistory;
use gpui_chart_overlays::{Candle, HostChart, HostViewport, Margins, SourceRef, Timeframe};

pub const MINUTE: i64 = 60_000;
/// Minute-aligned start of every fixture series.
pub const START: i64 = 1_700_000_040_000;

/// Host chart with a fixed 920x430 frame whose plot is 800 px wide
/// starting at x = 60, y = 10.
pub struct FakeHost {
    pub times: Vec<i64>,
    pub timeframe: Timeframe,
    pub spacing: f32,
    pub offset_x: f32,
    pub panned: f32,
}

impl FakeHost {
    /// 500 one-minute bars, 8 px apart, scrolled so the last 100 are visible.
    pub fn eurusd() -> Self {
        Self::with_times((0..500).map(|i| START + i * MINUTE).collect(), Timeframe::M1)
    }

    pub fn with_times(times: Vec<i64>, timeframe: Timeframe) -> Self {
        let spacing = 8.0;
        let offset_x = 800.0 - times.len() as f32 * spacing;
        Self {
            times,
            timeframe,
            spacing,
            offset_x,
            panned: 0.0,
        }
    }

    pub fn plot_top(&self) -> f32 {
        10.0
    }

    pub fn plot_height(&self) -> f32 {
        400.0
    }

    /// Window x of host bar `index`.
    pub fn x_of(&self, index: usize) -> f32 {
        self.viewport().index_to_x(index as f64)
    }
}

impl HostChart for FakeHost {
    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    fn viewport(&self) -> HostViewport {
        HostViewport {
            plot_left: 60.0,
            plot_width: 800.0,
            candle_spacing: self.spacing,
            offset_x: self.offset_x,
            candle_count: self.times.len(),
        }
    }

    fn candle_time(&self, index: usize) -> Option<i64> {
        self.times.get(index).copied()
    }

    fn chart_bounds(&self) -> Bounds<Pixels> {
        Bounds::new(point(px(0.0), px(0.0)), size(px(920.0), px(430.0)))
    }

    fn margins(&self) -> Margins {
        Margins::new(10.0, 60.0, 20.0, 60.0)
    }

    fn pan_horizontal(&mut self, dx: Pixels) {
        let dx = f32::from(dx);
        self.offset_x += dx;
        self.panned += dx;
    }
}

/// `n` one-minute bars from `start` oscillating around `base`.
pub fn minute_candles(start: i64, n: usize, base: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let mid = base + (i as f64 * 0.2).sin() * base * 0.001;
            let o = mid - base * 0.0002;
            let c = mid + base * 0.0002;
            Candle::new(
                start + i as i64 * MINUTE,
                o,
                o.max(c) + base * 0.0003,
                o.min(c) - base * 0.0003,
                c,
                100.0 + i as f64,
            )
        })
        .collect()
}

pub fn history(candles: Vec<Candle>) -> impl Fn(&SourceRef) -> eyre::Result<RawHistory> {
    move |_| Ok(RawHistory::Candles(candles.clone()))
}

pub fn text_history(text: &'static str) -> impl Fn(&SourceRef) -> eyre::Result<RawHistory> {
    move |_| Ok(RawHistory::Text(text.to_string()))
}

pub fn failing(reason: &'static str) -> impl Fn(&SourceRef) -> eyre::Result<RawHistory> {
    move |source| Err(eyre::eyre!("{reason} for {source}"))
}

pub fn pos(x: f32, y: f32) -> gpui::Point<Pixels> {
    point(px(x), px(y))
}
