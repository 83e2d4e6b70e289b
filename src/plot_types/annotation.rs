use crate::data_types::DrawingShape;
use crate::drawing_store::Projection;
use crate::rendering::{DrawCommand, SurfaceFrame};
use crate::utils::PixelsExt;
use gpui::*;

/// Paints drawings from data coordinates through a [`Projection`].
pub struct DrawingPainter<'a> {
    pub projection: &'a Projection<'a>,
    pub line_width: f32,
}

impl<'a> DrawingPainter<'a> {
    pub fn new(projection: &'a Projection<'a>) -> Self {
        Self {
            projection,
            line_width: 1.5,
        }
    }

    /// Returns whether anything was emitted. Shapes entirely off the plot
    /// are skipped.
    pub fn paint(&self, shape: &DrawingShape, color: Hsla, frame: &mut SurfaceFrame) -> bool {
        let plot = self.projection.plot();
        let (left, top) = (plot.origin.x.as_f32(), plot.origin.y.as_f32());
        let right = left + plot.size.width.as_f32();
        let bottom = top + plot.size.height.as_f32();
        let width = px(self.line_width);

        match *shape {
            DrawingShape::Horizontal { price } => {
                let y = self.projection.price_to_y(price);
                if y < top || y > bottom {
                    return false;
                }
                frame.push(DrawCommand::Line {
                    from: point(px(left), px(y)),
                    to: point(px(right), px(y)),
                    color,
                    width,
                });
                true
            }
            DrawingShape::Vertical { data_index } => {
                let Some(x) = self.projection.index_to_x(data_index) else {
                    return false;
                };
                if x < left || x > right {
                    return false;
                }
                frame.push(DrawCommand::Line {
                    from: point(px(x), px(top)),
                    to: point(px(x), px(bottom)),
                    color,
                    width,
                });
                true
            }
            DrawingShape::Trendline {
                start_index,
                start_price,
                end_index,
                end_price,
            } => {
                let Some((a, b)) = self.corners(start_index, start_price, end_index, end_price)
                else {
                    return false;
                };
                if !overlaps(a, b, (left, top, right, bottom)) {
                    return false;
                }
                frame.push(DrawCommand::Line {
                    from: point(px(a.0), px(a.1)),
                    to: point(px(b.0), px(b.1)),
                    color,
                    width,
                });
                true
            }
            DrawingShape::Rectangle {
                start_index,
                start_price,
                end_index,
                end_price,
            } => {
                let Some((a, b)) = self.corners(start_index, start_price, end_index, end_price)
                else {
                    return false;
                };
                if !overlaps(a, b, (left, top, right, bottom)) {
                    return false;
                }
                let bounds = Bounds::from_corners(
                    point(px(a.0.min(b.0)), px(a.1.min(b.1))),
                    point(px(a.0.max(b.0)), px(a.1.max(b.1))),
                );
                frame.push(DrawCommand::FillRect {
                    bounds,
                    color: color.alpha(0.15),
                });
                frame.push(DrawCommand::StrokeRect { bounds, color });
                true
            }
        }
    }

    fn corners(
        &self,
        start_index: f64,
        start_price: f64,
        end_index: f64,
        end_price: f64,
    ) -> Option<((f32, f32), (f32, f32))> {
        let x1 = self.projection.index_to_x(start_index)?;
        let x2 = self.projection.index_to_x(end_index)?;
        let y1 = self.projection.price_to_y(start_price);
        let y2 = self.projection.price_to_y(end_price);
        Some(((x1, y1), (x2, y2)))
    }
}

fn overlaps(a: (f32, f32), b: (f32, f32), (left, top, right, bottom): (f32, f32, f32, f32)) -> bool {
    a.0.max(b.0) >= left && a.0.min(b.0) <= right && a.1.max(b.1) >= top && a.1.min(b.1) <= bottom
}
