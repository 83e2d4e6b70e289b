use super::{PaintContext, ProjectedCandle, SeriesPainter};
use crate::data_types::CandleStyle;
use crate::rendering::{DrawCommand, SurfaceFrame};
use gpui::*;

/// OHLC bars: high-low stem, open tick on the left, close tick on the right.
pub struct BarPlot {
    pub style: CandleStyle,
}

impl BarPlot {
    pub fn new(style: CandleStyle) -> Self {
        Self { style }
    }
}

impl SeriesPainter for BarPlot {
    fn paint(&self, candles: &[ProjectedCandle], ctx: &PaintContext<'_>, frame: &mut SurfaceFrame) {
        let tick = (ctx.spacing * self.style.body_width_pct / 2.0).max(1.0);

        for pc in candles {
            let candle = &pc.candle;
            let color = self.style.body(candle.is_up());
            let y_o = ctx.transform.price_to_y(candle.o);
            let y_c = ctx.transform.price_to_y(candle.c);
            let x = pc.x;

            frame.push(DrawCommand::Line {
                from: point(px(x), px(ctx.transform.price_to_y(candle.h))),
                to: point(px(x), px(ctx.transform.price_to_y(candle.l))),
                color,
                width: px(1.0),
            });
            frame.push(DrawCommand::Line {
                from: point(px(x - tick), px(y_o)),
                to: point(px(x), px(y_o)),
                color,
                width: px(1.0),
            });
            frame.push(DrawCommand::Line {
                from: point(px(x), px(y_c)),
                to: point(px(x + tick), px(y_c)),
                color,
                width: px(1.0),
            });
        }
    }
}
