use super::{PaintContext, ProjectedCandle, SeriesPainter};
use crate::rendering::{DrawCommand, SurfaceFrame};
use gpui::*;

/// Close prices joined by a polyline.
pub struct LinePlot {
    pub color: Hsla,
    pub line_width: f32,
}

impl LinePlot {
    pub fn new(color: Hsla, line_width: f32) -> Self {
        Self { color, line_width }
    }
}

impl SeriesPainter for LinePlot {
    fn paint(&self, candles: &[ProjectedCandle], ctx: &PaintContext<'_>, frame: &mut SurfaceFrame) {
        let mut points = Vec::with_capacity(candles.len());
        let mut last_px = (f32::MIN, 0.0f32);

        for pc in candles {
            let x = pc.x;
            let y = ctx.transform.price_to_y(pc.candle.c);

            // Same pixel column and barely moved: nothing to add.
            if !points.is_empty() && (x - last_px.0).abs() < 0.5 && (y - last_px.1).abs() < 1.0 {
                continue;
            }
            points.push(point(px(x), px(y)));
            last_px = (x, y);
        }

        if points.len() >= 2 {
            frame.push(DrawCommand::Polyline {
                points,
                color: self.color,
                width: px(self.line_width),
            });
        }
    }
}
