// Area plot implementation

use super::{LinePlot, PaintContext, ProjectedCandle, SeriesPainter};
use crate::rendering::{DrawCommand, SurfaceFrame};
use gpui::*;

/// Close line with the region below it filled down to the plot bottom.
pub struct AreaPlot {
    pub color: Hsla,
    pub line_width: f32,
    pub opacity: f32,
}

impl AreaPlot {
    pub fn new(color: Hsla, line_width: f32, opacity: f32) -> Self {
        Self {
            color,
            line_width,
            opacity,
        }
    }
}

impl SeriesPainter for AreaPlot {
    fn paint(&self, candles: &[ProjectedCandle], ctx: &PaintContext<'_>, frame: &mut SurfaceFrame) {
        let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
            return;
        };
        if candles.len() < 2 {
            return;
        }

        let baseline = ctx.plot.origin.y + ctx.plot.size.height;
        let mut polygon = Vec::with_capacity(candles.len() + 2);
        polygon.push(point(px(first.x), baseline));
        polygon.extend(
            candles
                .iter()
                .map(|pc| point(px(pc.x), px(ctx.transform.price_to_y(pc.candle.c)))),
        );
        polygon.push(point(px(last.x), baseline));

        frame.push(DrawCommand::FillPolygon {
            points: polygon,
            color: self.color.alpha(self.opacity.clamp(0.0, 1.0)),
        });

        LinePlot::new(self.color, self.line_width).paint(candles, ctx, frame);
    }
}
