//! Per-surface price axis: base range, zoom/offset state and the
//! price <-> pixel mapping built from them.

use crate::data_types::Candle;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, price: f64) -> bool {
        (self.min..=self.max).contains(&price)
    }

    /// Lowest low to highest high of `candles`, padded. `None` if empty.
    pub fn from_candles(candles: &[Candle], padding: f64) -> Option<Self> {
        let (min, max) = candles
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c.l), hi.max(c.h))
            });
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        Some(Self::new(min, max).padded(padding))
    }

    /// Grows the range by `padding` of its span on each side. A flat range
    /// grows by 5% of its price instead (1.0 at price zero).
    pub fn padded(self, padding: f64) -> Self {
        let span = self.span();
        let pad = if span > f64::EPSILON {
            span * padding
        } else if self.max.abs() > f64::EPSILON {
            self.max.abs() * 0.05
        } else {
            1.0
        };
        Self::new(self.min - pad, self.max + pad)
    }
}

/// Zoom/offset state of one surface's price axis.
///
/// In auto mode the base range follows the visible data every frame and
/// zoom/offset are ignored. In manual mode the base range is frozen at the
/// moment manual mode starts and zoom/offset apply on top of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleState {
    pub zoom: f64,
    /// Shift of the displayed centre, in price units. Positive shows higher prices.
    pub offset: f64,
    pub auto_scale: bool,
    anchor: Option<PriceRange>,
}

impl Default for ScaleState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: 0.0,
            auto_scale: true,
            anchor: None,
        }
    }
}

impl ScaleState {
    pub fn is_manual(&self) -> bool {
        !self.auto_scale
    }

    pub fn anchor(&self) -> Option<PriceRange> {
        self.anchor
    }

    /// Base range for this frame given the range of the visible data.
    pub fn base_range(&mut self, visible: Option<PriceRange>) -> Option<PriceRange> {
        if self.auto_scale {
            return visible;
        }
        if self.anchor.is_none() {
            self.anchor = visible;
        }
        self.anchor
    }

    /// Switches to manual mode, freezing `base` unless already frozen.
    pub fn enter_manual(&mut self, base: PriceRange) {
        if self.auto_scale {
            self.auto_scale = false;
            self.zoom = 1.0;
            self.offset = 0.0;
        }
        if self.anchor.is_none() {
            self.anchor = Some(base);
        }
    }

    /// Sets a manual zoom/offset relative to `base`.
    pub fn set_manual(&mut self, zoom: f64, offset: f64, base: PriceRange) {
        self.enter_manual(base);
        self.zoom = zoom;
        self.offset = offset;
    }

    /// Back to the fitted default. Only this surface is touched.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Restores persisted zoom/offset. The anchor is picked up from the next
    /// rendered frame.
    pub fn restore(&mut self, zoom: f64, offset: f64, auto_scale: bool) {
        self.zoom = zoom;
        self.offset = offset;
        self.auto_scale = auto_scale;
        self.anchor = None;
    }

    /// Leaves manual mode without touching zoom/offset.
    pub fn set_auto(&mut self, auto_scale: bool) {
        if auto_scale {
            self.reset();
        } else {
            self.auto_scale = false;
        }
    }

    pub fn transform(&self, base: PriceRange, top: f32, height: f32) -> AxisTransform {
        if self.auto_scale {
            AxisTransform::new(base.min, base.max, 1.0, 0.0, top, height)
        } else {
            AxisTransform::new(base.min, base.max, self.zoom, self.offset, top, height)
        }
    }
}

/// Price <-> vertical pixel mapping of one surface. Pure and cheap to copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisTransform {
    base: PriceRange,
    zoom: f64,
    offset: f64,
    top: f32,
    height: f32,
}

impl AxisTransform {
    pub fn new(base_min: f64, base_max: f64, zoom: f64, offset: f64, top: f32, height: f32) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        Self {
            base: PriceRange::new(base_min, base_max),
            zoom,
            offset,
            top,
            height,
        }
    }

    pub fn base(&self) -> PriceRange {
        self.base
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn displayed_span(&self) -> f64 {
        self.base.span() / self.zoom
    }

    pub fn displayed_range(&self) -> PriceRange {
        let center = self.base.center() + self.offset;
        let half = self.displayed_span() / 2.0;
        PriceRange::new(center - half, center + half)
    }

    pub fn price_to_y(&self, price: f64) -> f32 {
        let span = self.displayed_span();
        if span <= 0.0 || self.height <= 0.0 {
            return self.top + self.height / 2.0;
        }
        let disp = self.displayed_range();
        self.top + ((disp.max - price) / span * self.height as f64) as f32
    }

    pub fn y_to_price(&self, y: f32) -> f64 {
        let disp = self.displayed_range();
        if self.height <= 0.0 {
            return disp.center();
        }
        disp.max - ((y - self.top) / self.height) as f64 * self.displayed_span()
    }

    /// Vertical position of `y` as a fraction of the height, 0 at the top.
    pub fn ratio_at(&self, y: f32) -> f64 {
        if self.height <= 0.0 {
            return 0.5;
        }
        ((y - self.top) / self.height) as f64
    }
}
