use super::{PaintContext, ProjectedCandle, SeriesPainter};
use crate::data_types::CandleStyle;
use crate::rendering::{rect, DrawCommand, SurfaceFrame};
use gpui::*;

/// Candlestick plot type. Hollow candles leave up bodies unfilled.
pub struct CandlestickPlot {
    pub style: CandleStyle,
    pub hollow: bool,
}

impl CandlestickPlot {
    pub fn new(style: CandleStyle) -> Self {
        Self {
            style,
            hollow: false,
        }
    }

    pub fn hollow(style: CandleStyle) -> Self {
        Self {
            style,
            hollow: true,
        }
    }
}

impl SeriesPainter for CandlestickPlot {
    fn paint(&self, candles: &[ProjectedCandle], ctx: &PaintContext<'_>, frame: &mut SurfaceFrame) {
        let body_w = (ctx.spacing * self.style.body_width_pct).max(1.0);

        for pc in candles {
            let candle = &pc.candle;
            let up = candle.is_up();
            let y_h = ctx.transform.price_to_y(candle.h);
            let y_l = ctx.transform.price_to_y(candle.l);
            let y_o = ctx.transform.price_to_y(candle.o);
            let y_c = ctx.transform.price_to_y(candle.c);
            let (b_top, b_bot) = if up { (y_c, y_o) } else { (y_o, y_c) };
            let body = rect(pc.x - body_w / 2.0, b_top, body_w, (b_bot - b_top).max(1.0));

            if self.style.show_wick {
                frame.push(DrawCommand::Line {
                    from: point(px(pc.x), px(y_h)),
                    to: point(px(pc.x), px(y_l)),
                    color: self.style.wick(up),
                    width: px(1.0),
                });
            }
            let fill_body = self.style.show_body && !(self.hollow && up);
            if fill_body {
                frame.push(DrawCommand::FillRect {
                    bounds: body,
                    color: self.style.body(up),
                });
            }
            if self.style.show_border || (self.hollow && up) {
                frame.push(DrawCommand::StrokeRect {
                    bounds: body,
                    color: self.style.border(up),
                });
            }
        }
    }
}
