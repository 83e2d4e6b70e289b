// Series painters, one per display style

pub mod annotation;
pub mod area;
pub mod bar;
pub mod candlestick;
pub mod line;

pub use annotation::DrawingPainter;
pub use area::AreaPlot;
pub use bar::BarPlot;
pub use candlestick::CandlestickPlot;
pub use line::LinePlot;

use crate::data_types::{Candle, CandleStyle, OverlayDisplay, PaneDisplay};
use crate::rendering::SurfaceFrame;
use crate::transform::AxisTransform;
use gpui::{Bounds, Hsla, Pixels};

/// A surface candle already placed on the host time axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedCandle {
    /// Window x of the bar centre.
    pub x: f32,
    pub candle: Candle,
}

pub struct PaintContext<'a> {
    pub plot: Bounds<Pixels>,
    pub transform: &'a AxisTransform,
    /// Host candle spacing, used for body widths.
    pub spacing: f32,
}

/// Trait for painting a projected series into a surface frame.
pub trait SeriesPainter {
    fn paint(&self, candles: &[ProjectedCandle], ctx: &PaintContext<'_>, frame: &mut SurfaceFrame);
}

pub fn overlay_painter(
    display: OverlayDisplay,
    color: Hsla,
    line_width: f32,
    style: &CandleStyle,
) -> Box<dyn SeriesPainter> {
    match display {
        OverlayDisplay::Line => Box::new(LinePlot::new(color, line_width)),
        OverlayDisplay::Candles => Box::new(CandlestickPlot::new(style.clone())),
    }
}

pub fn pane_painter(
    display: PaneDisplay,
    color: Hsla,
    line_width: f32,
    area_opacity: f32,
    style: &CandleStyle,
) -> Box<dyn SeriesPainter> {
    match display {
        PaneDisplay::Candles => Box::new(CandlestickPlot::new(style.clone())),
        PaneDisplay::Hollow => Box::new(CandlestickPlot::hollow(style.clone())),
        PaneDisplay::Bars => Box::new(BarPlot::new(style.clone())),
        PaneDisplay::Line => Box::new(LinePlot::new(color, line_width)),
        PaneDisplay::Area => Box::new(AreaPlot::new(color, line_width, area_opacity)),
    }
}
