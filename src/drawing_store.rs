//! Annotations of one pane, kept in data coordinates.
//!
//! Nothing here caches pixels: every frame re-projects each drawing through
//! the current [`Projection`], so drawings follow the host scroll and the
//! pane's price scale.

use crate::alignment::{index_to_time, time_to_index, HostAxis};
use crate::data_types::{Candle, DataPoint, Drawing, DrawingId, DrawingShape, PendingDrawing, Timeframe};
use crate::gesture::DataProjector;
use crate::host::HostChart;
use crate::plot_types::DrawingPainter;
use crate::rendering::SurfaceFrame;
use crate::transform::AxisTransform;
use crate::utils::PixelsExt;
use gpui::{px, Bounds, Hsla, Pixels, Point};

#[derive(Clone, Debug, Default)]
pub struct DrawingStore {
    drawings: Vec<Drawing>,
    next_id: u64,
}

impl DrawingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shape: DrawingShape, color: Hsla) -> DrawingId {
        let id = DrawingId(self.next_id);
        self.next_id += 1;
        self.drawings.push(Drawing { id, shape, color });
        id
    }

    /// Re-inserts a persisted drawing, keeping its id.
    pub fn insert(&mut self, drawing: Drawing) {
        self.next_id = self.next_id.max(drawing.id.0 + 1);
        self.drawings.retain(|d| d.id != drawing.id);
        self.drawings.push(drawing);
    }

    pub fn remove(&mut self, id: DrawingId) -> Option<Drawing> {
        let index = self.drawings.iter().position(|d| d.id == id)?;
        Some(self.drawings.remove(index))
    }

    pub fn clear(&mut self) {
        self.drawings.clear();
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawing> {
        self.drawings.iter()
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    /// Paints every drawing in insertion order. Returns how many were on screen.
    pub fn render(&self, projection: &Projection<'_>, frame: &mut SurfaceFrame) -> usize {
        let painter = DrawingPainter::new(projection);
        self.drawings
            .iter()
            .filter(|d| painter.paint(&d.shape, d.color, frame))
            .count()
    }

    /// Paints an in-progress two-point drawing, faded by `opacity`.
    pub fn render_pending(
        pending: &PendingDrawing,
        opacity: f32,
        projection: &Projection<'_>,
        frame: &mut SurfaceFrame,
    ) -> bool {
        let color = pending.color.alpha(pending.color.a * opacity);
        DrawingPainter::new(projection).paint(&pending.shape(), color, frame)
    }
}

/// Data <-> pixel mapping of a pane for one frame.
///
/// X goes through time: a data index into the pane series becomes a
/// timestamp, then a fractional host index, then a pixel via the host. Y is
/// the pane's own price transform.
pub struct Projection<'a> {
    host: &'a dyn HostChart,
    series: &'a [Candle],
    timeframe: Timeframe,
    transform: AxisTransform,
    plot: Bounds<Pixels>,
}

impl<'a> Projection<'a> {
    pub fn new(
        host: &'a dyn HostChart,
        series: &'a [Candle],
        transform: AxisTransform,
        plot: Bounds<Pixels>,
    ) -> Self {
        Self {
            host,
            series,
            timeframe: host.timeframe(),
            transform,
            plot,
        }
    }

    pub fn plot(&self) -> Bounds<Pixels> {
        self.plot
    }

    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    pub fn index_to_x(&self, data_index: f64) -> Option<f32> {
        let t = index_to_time(self.series, data_index, self.timeframe)?;
        let host_index = time_to_index(&HostAxis(self.host), t, self.timeframe)?;
        Some(self.host.data_index_to_pixel(host_index).as_f32())
    }

    pub fn x_to_index(&self, x: f32) -> Option<f64> {
        let host_index = self.host.pixel_to_data_index(px(x));
        let t = index_to_time(&HostAxis(self.host), host_index, self.timeframe)?;
        time_to_index(self.series, t, self.timeframe)
    }

    pub fn price_to_y(&self, price: f64) -> f32 {
        self.transform.price_to_y(price)
    }

    pub fn y_to_price(&self, y: f32) -> f64 {
        self.transform.y_to_price(y)
    }

    pub fn to_screen(&self, point: DataPoint) -> Option<Point<Pixels>> {
        let x = self.index_to_x(point.index)?;
        Some(gpui::point(px(x), px(self.price_to_y(point.price))))
    }
}

impl DataProjector for Projection<'_> {
    fn to_data(&self, position: Point<Pixels>) -> Option<DataPoint> {
        if !self.plot.contains(&position) {
            return None;
        }
        let index = self.x_to_index(position.x.as_f32())?;
        Some(DataPoint::new(index, self.y_to_price(position.y.as_f32())))
    }
}
