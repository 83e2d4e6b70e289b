// Rendering output of the engine and the shared painters for axis,
// price tag, crosshair and legend.

use crate::data_types::SurfaceId;
use crate::gesture::AxisSide;
use crate::theme::ChartTheme;
use crate::transform::AxisTransform;
use crate::utils::PixelsExt;
use d3rs::scale::{LinearScale, Scale};
use gpui::*;

/// Logical layer a run of commands belongs to, in paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Series,
    Axis,
    PriceTag,
    Drawings,
    Crosshair,
    Legend,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Left,
    Right,
}

/// One primitive of the display list. Coordinates are window pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Marks the start of a layer.
    Layer(Layer),
    PushClip(Bounds<Pixels>),
    PopClip,
    FillRect {
        bounds: Bounds<Pixels>,
        color: Hsla,
    },
    StrokeRect {
        bounds: Bounds<Pixels>,
        color: Hsla,
    },
    Line {
        from: Point<Pixels>,
        to: Point<Pixels>,
        color: Hsla,
        width: Pixels,
    },
    Polyline {
        points: Vec<Point<Pixels>>,
        color: Hsla,
        width: Pixels,
    },
    FillPolygon {
        points: Vec<Point<Pixels>>,
        color: Hsla,
    },
    /// `width` is the box the text is aligned in when anchored right.
    Text {
        origin: Point<Pixels>,
        text: String,
        size: Pixels,
        color: Hsla,
        anchor: TextAnchor,
        width: Option<Pixels>,
    },
}

/// Display list of one overlay or pane for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceFrame {
    pub surface: SurfaceId,
    pub bounds: Bounds<Pixels>,
    pub commands: Vec<DrawCommand>,
}

impl SurfaceFrame {
    pub fn new(surface: SurfaceId, bounds: Bounds<Pixels>) -> Self {
        Self {
            surface,
            bounds,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn begin_layer(&mut self, layer: Layer) {
        self.commands.push(DrawCommand::Layer(layer));
    }

    /// Runs `paint` with everything it pushes clipped to `bounds`.
    pub fn clipped(&mut self, bounds: Bounds<Pixels>, paint: impl FnOnce(&mut Self)) {
        self.commands.push(DrawCommand::PushClip(bounds));
        paint(self);
        self.commands.push(DrawCommand::PopClip);
    }

    pub fn layers(&self) -> Vec<Layer> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Layer(layer) => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Commands between the marker of `layer` and the next marker.
    pub fn layer_commands(&self, layer: Layer) -> &[DrawCommand] {
        let Some(start) = self
            .commands
            .iter()
            .position(|c| *c == DrawCommand::Layer(layer))
        else {
            return &[];
        };
        let rest = &self.commands[start + 1..];
        let end = rest
            .iter()
            .position(|c| matches!(c, DrawCommand::Layer(_)))
            .unwrap_or(rest.len());
        &rest[..end]
    }
}

/// Non-fatal per-surface conditions of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceDiagnostic {
    /// The source parsed to zero candles.
    ParseFailure,
    /// Candles without a host bar within half a bar width.
    AlignmentMiss { skipped: usize },
    /// Fewer than two candles inside the visible window.
    EmptyWindow { candles: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceReport {
    pub surface: SurfaceId,
    pub drawn_candles: usize,
    pub drawn_drawings: usize,
    pub diagnostics: Vec<SurfaceDiagnostic>,
}

impl SurfaceReport {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            drawn_candles: 0,
            drawn_drawings: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn has(&self, diagnostic: SurfaceDiagnostic) -> bool {
        self.diagnostics.contains(&diagnostic)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub surfaces: Vec<SurfaceReport>,
}

impl FrameReport {
    pub fn surface(&self, id: impl Into<SurfaceId>) -> Option<&SurfaceReport> {
        let id = id.into();
        self.surfaces.iter().find(|s| s.surface == id)
    }
}

/// Everything rendered in one synchronizer pass, overlays first, then panes
/// top to bottom.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub surfaces: Vec<SurfaceFrame>,
    pub report: FrameReport,
}

impl Frame {
    pub fn surface(&self, id: impl Into<SurfaceId>) -> Option<&SurfaceFrame> {
        let id = id.into();
        self.surfaces.iter().find(|s| s.surface == id)
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds<Pixels> {
    Bounds::new(point(px(x), px(y)), size(px(w.max(0.0)), px(h.max(0.0))))
}

/// Formats a price with as many decimals as the tick step needs.
pub fn format_price(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).clamp(0.0, 8.0) as usize
    } else {
        2
    };
    format!("{value:.decimals$}")
}

fn tick_step(ticks: &[f64]) -> f64 {
    match ticks {
        [a, b, ..] => (b - a).abs(),
        [v] => v.abs() / 100.0,
        [] => 0.0,
    }
}

/// Ticks of the displayed price range, roughly one per `spacing_px`.
pub fn price_ticks(transform: &AxisTransform, spacing_px: f32) -> Vec<f64> {
    let range = transform.displayed_range();
    if range.span() <= 0.0 || transform.height() <= 0.0 {
        return Vec::new();
    }
    let count = ((transform.height() / spacing_px.max(1.0)).round() as usize).max(2);
    let bottom = (transform.top() + transform.height()) as f64;
    LinearScale::new()
        .domain(range.min, range.max)
        .range(bottom, transform.top() as f64)
        .ticks(count)
        .into_iter()
        .filter(|t| range.contains(*t))
        .collect()
}

/// Background, edge, tick marks and labels of a price axis strip.
pub fn paint_axis(
    frame: &mut SurfaceFrame,
    strip: Bounds<Pixels>,
    side: AxisSide,
    transform: &AxisTransform,
    theme: &ChartTheme,
    tick_spacing_px: f32,
) {
    let left = strip.origin.x.as_f32();
    let width = strip.size.width.as_f32();
    let top = strip.origin.y.as_f32();
    let height = strip.size.height.as_f32();
    let edge_x = match side {
        AxisSide::Left => left + width,
        AxisSide::Right => left,
    };

    frame.push(DrawCommand::FillRect {
        bounds: strip,
        color: theme.axis_background,
    });
    frame.push(DrawCommand::Line {
        from: point(px(edge_x), px(top)),
        to: point(px(edge_x), px(top + height)),
        color: theme.axis_line,
        width: px(1.0),
    });

    let ticks = price_ticks(transform, tick_spacing_px);
    let step = tick_step(&ticks);
    let label_size = theme.axis_label_size;
    for tick in ticks {
        let y = transform.price_to_y(tick);
        let (tick_from, tick_to) = match side {
            AxisSide::Left => (edge_x - 4.0, edge_x),
            AxisSide::Right => (edge_x, edge_x + 4.0),
        };
        frame.push(DrawCommand::Line {
            from: point(px(tick_from), px(y)),
            to: point(px(tick_to), px(y)),
            color: theme.tick_line,
            width: px(1.0),
        });
        frame.push(axis_label(
            strip,
            side,
            y,
            format_price(tick, step),
            label_size,
            theme.axis_label,
        ));
    }
}

fn axis_label(
    strip: Bounds<Pixels>,
    side: AxisSide,
    y: f32,
    text: String,
    size: Pixels,
    color: Hsla,
) -> DrawCommand {
    let left = strip.origin.x.as_f32();
    let width = strip.size.width.as_f32();
    let origin_y = y - size.as_f32() / 2.0;
    match side {
        AxisSide::Left => DrawCommand::Text {
            origin: point(px(left), px(origin_y)),
            text,
            size,
            color,
            anchor: TextAnchor::Right,
            width: Some(px((width - 6.0).max(0.0))),
        },
        AxisSide::Right => DrawCommand::Text {
            origin: point(px(left + 6.0), px(origin_y)),
            text,
            size,
            color,
            anchor: TextAnchor::Left,
            width: None,
        },
    }
}

/// Floating label with the last visible price, in the surface colour.
pub fn paint_price_tag(
    frame: &mut SurfaceFrame,
    strip: Bounds<Pixels>,
    side: AxisSide,
    price: f64,
    transform: &AxisTransform,
    color: Hsla,
    theme: &ChartTheme,
) {
    let y = transform.price_to_y(price);
    let top = strip.origin.y.as_f32();
    let bottom = top + strip.size.height.as_f32();
    if y < top || y > bottom {
        return;
    }
    let size = theme.axis_label_size;
    let tag_height = size.as_f32() + 6.0;
    let step = transform.displayed_span() / 100.0;
    frame.push(DrawCommand::FillRect {
        bounds: rect(
            strip.origin.x.as_f32(),
            y - tag_height / 2.0,
            strip.size.width.as_f32(),
            tag_height,
        ),
        color,
    });
    frame.push(axis_label(
        strip,
        side,
        y,
        format_price(price, step),
        size,
        theme.tag_text,
    ));
}

/// Crosshair lines across the plot and the hovered price on the axis.
pub fn paint_crosshair(
    frame: &mut SurfaceFrame,
    plot: Bounds<Pixels>,
    strip: Option<(Bounds<Pixels>, AxisSide)>,
    position: Point<Pixels>,
    transform: &AxisTransform,
    theme: &ChartTheme,
) {
    if !plot.contains(&position) {
        return;
    }
    let left = plot.origin.x;
    let right = plot.origin.x + plot.size.width;
    let top = plot.origin.y;
    let bottom = plot.origin.y + plot.size.height;

    frame.push(DrawCommand::Line {
        from: point(left, position.y),
        to: point(right, position.y),
        color: theme.crosshair_line,
        width: px(1.0),
    });
    frame.push(DrawCommand::Line {
        from: point(position.x, top),
        to: point(position.x, bottom),
        color: theme.crosshair_line,
        width: px(1.0),
    });

    if let Some((strip, side)) = strip {
        let price = transform.y_to_price(position.y.as_f32());
        let step = transform.displayed_span() / 100.0;
        let tag_height = theme.axis_label_size.as_f32() + 6.0;
        frame.push(DrawCommand::FillRect {
            bounds: rect(
                strip.origin.x.as_f32(),
                position.y.as_f32() - tag_height / 2.0,
                strip.size.width.as_f32(),
                tag_height,
            ),
            color: theme.tag_background,
        });
        frame.push(axis_label(
            strip,
            side,
            position.y.as_f32(),
            format_price(price, step),
            theme.axis_label_size,
            theme.tag_text,
        ));
    }
}

/// Legend lines stacked at the top-left corner of the plot.
pub fn paint_legend(
    frame: &mut SurfaceFrame,
    plot: Bounds<Pixels>,
    lines: &[(String, Hsla)],
    theme: &ChartTheme,
) {
    let size = theme.legend_size;
    let mut origin = point(plot.origin.x + px(6.0), plot.origin.y + px(4.0));
    for (text, color) in lines {
        frame.push(DrawCommand::Text {
            origin,
            text: text.clone(),
            size,
            color: *color,
            anchor: TextAnchor::Left,
            width: None,
        });
        origin.y += size + px(2.0);
    }
}
