//! Narrow contract between the engine and the host chart.
//!
//! The host keeps ownership of its own candles, scroll state and input. It
//! exposes read-only primitives that the engine polls every frame, a
//! post-redraw hook and a horizontal pan entry point.

use crate::data_types::{SurfaceId, Timeframe};
use crate::utils::PixelsExt;
use gpui::{px, Bounds, Pixels};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Insets the host reserves around its plot for axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    pub top: Pixels,
    pub bottom: Pixels,
    pub left: Pixels,
    pub right: Pixels,
}

impl Margins {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top: px(top),
            bottom: px(bottom),
            left: px(left),
            right: px(right),
        }
    }
}

/// Horizontal scroll/zoom state of the host chart.
///
/// Candle `i` is centred at `plot_left + offset_x + (i + 0.5) * candle_spacing`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostViewport {
    /// Window x of the left edge of the host plot area.
    pub plot_left: f32,
    pub plot_width: f32,
    pub candle_spacing: f32,
    /// Horizontal scroll in pixels; negative once the chart is scrolled right.
    pub offset_x: f32,
    pub candle_count: usize,
}

impl HostViewport {
    pub fn index_to_x(&self, index: f64) -> f32 {
        self.plot_left
            + self.offset_x
            + ((index + 0.5) * self.candle_spacing as f64) as f32
    }

    pub fn x_to_index(&self, x: f32) -> f64 {
        if self.candle_spacing <= 0.0 {
            return 0.0;
        }
        ((x - self.plot_left - self.offset_x) / self.candle_spacing) as f64 - 0.5
    }

    /// Inclusive range of candle indices whose centre lies inside the plot.
    pub fn visible_indices(&self) -> Option<(usize, usize)> {
        if self.candle_count == 0 || self.candle_spacing <= 0.0 || self.plot_width <= 0.0 {
            return None;
        }
        let last = (self.candle_count - 1) as f64;
        let spacing = self.candle_spacing as f64;
        let offset = self.offset_x as f64;
        let first = (-offset / spacing - 0.5).ceil().max(0.0);
        let end = ((self.plot_width as f64 - offset) / spacing - 0.5)
            .floor()
            .min(last);
        if end < first {
            return None;
        }
        Some((first as usize, end as usize))
    }
}

/// Primitives the engine reads from the host chart.
pub trait HostChart {
    fn timeframe(&self) -> Timeframe;

    fn viewport(&self) -> HostViewport;

    /// Open time (ms) of host candle `index`.
    fn candle_time(&self, index: usize) -> Option<i64>;

    /// Full bounds of the host chart, axes included, in window coordinates.
    fn chart_bounds(&self) -> Bounds<Pixels>;

    fn margins(&self) -> Margins;

    fn data_index_to_pixel(&self, index: f64) -> Pixels {
        px(self.viewport().index_to_x(index))
    }

    fn pixel_to_data_index(&self, x: Pixels) -> f64 {
        self.viewport().x_to_index(x.as_f32())
    }

    /// Receives horizontal drag the engine does not consume itself.
    fn pan_horizontal(&mut self, dx: Pixels);

    /// Plot area of the host chart: its bounds minus the axis margins.
    fn plot_bounds(&self) -> Bounds<Pixels> {
        let chart = self.chart_bounds();
        let m = self.margins();
        Bounds::new(
            gpui::point(chart.origin.x + m.left, chart.origin.y + m.top),
            gpui::size(
                (chart.size.width - m.left - m.right).max(px(0.0)),
                (chart.size.height - m.top - m.bottom).max(px(0.0)),
            ),
        )
    }
}

/// Host candles currently on screen, as indices and as times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: i64,
    pub end_time: i64,
}

impl VisibleWindow {
    pub fn from_host(host: &dyn HostChart) -> Option<Self> {
        let (start_index, end_index) = host.viewport().visible_indices()?;
        Some(Self {
            start_index,
            end_index,
            start_time: host.candle_time(start_index)?,
            end_time: host.candle_time(end_index)?,
        })
    }

    pub fn contains_time(&self, t: i64) -> bool {
        (self.start_time..=self.end_time).contains(&t)
    }

    pub fn candle_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawReason {
    Scroll,
    Zoom,
    Resize,
    Tick,
    /// Explicit resync requested by the UI layer.
    Forced,
}

type Observer = Arc<dyn Fn(RedrawReason) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

/// Post-redraw observer list owned by the host chart. The host calls
/// [`RedrawHub::notify`] after finishing each of its own frames.
#[derive(Clone, Default)]
pub struct RedrawHub {
    inner: Arc<Mutex<HubInner>>,
}

impl RedrawHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: impl Fn(RedrawReason) + Send + Sync + 'static) -> Subscription {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push((id, Arc::new(observer)));
        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    pub fn notify(&self, reason: RedrawReason) {
        // Observers run outside the lock so they may subscribe or drop.
        let observers: Vec<Observer> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        for observer in observers {
            observer(reason);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

/// Keeps an observer registered until dropped.
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<HubInner>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.lock().observers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Registry of surfaces that currently hold the pointer.
///
/// A surface that starts a drag captures the pointer so moves and the final
/// release reach it even outside its bounds. The capture lives exactly as
/// long as its [`CaptureGuard`].
#[derive(Clone, Default)]
pub struct PointerCapture {
    active: Arc<Mutex<HashMap<SurfaceId, usize>>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self, surface: SurfaceId) -> CaptureGuard {
        *self.active.lock().entry(surface).or_insert(0) += 1;
        debug!(%surface, "pointer captured");
        CaptureGuard {
            surface,
            registry: Arc::downgrade(&self.active),
        }
    }

    pub fn is_captured(&self, surface: SurfaceId) -> bool {
        self.active.lock().contains_key(&surface)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().values().sum()
    }
}

pub struct CaptureGuard {
    surface: SurfaceId,
    registry: Weak<Mutex<HashMap<SurfaceId, usize>>>,
}

impl CaptureGuard {
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut active = registry.lock();
        if let Some(count) = active.get_mut(&self.surface) {
            *count -= 1;
            if *count == 0 {
                active.remove(&self.surface);
            }
        }
        debug!(surface = %self.surface, "pointer released");
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("surface", &self.surface)
            .finish()
    }
}
