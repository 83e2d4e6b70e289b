//! Pointer gesture disambiguation for one surface.
//!
//! A press starts a session in `Pending`. Once the pointer travels past the
//! drag threshold the session becomes a zoom, move, free or draw drag,
//! depending on where the press landed and what the caller allowed. Releasing
//! before the threshold is a click. The classifier never mutates a surface
//! itself: it returns [`GestureEffect`]s the owner applies.

use crate::data_types::{DataPoint, DrawingContext, DrawingShape, PendingDrawing, SurfaceId};
use crate::host::{CaptureGuard, PointerCapture};
use crate::transform::{AxisTransform, PriceRange};
use crate::utils::PixelsExt;
use crate::view_controller::ViewController;
use gpui::{Bounds, Hsla, MouseDownEvent, MouseMoveEvent, MouseUpEvent, Pixels, Point};
use tracing::debug;

/// Pointer sample in window coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Point<Pixels>,
    pub click_count: usize,
    /// Whether a button is still held. A move without it ends any drag.
    pub pressed: bool,
}

impl PointerEvent {
    pub fn new(position: Point<Pixels>) -> Self {
        Self {
            position,
            click_count: 1,
            pressed: true,
        }
    }

    pub fn double(position: Point<Pixels>) -> Self {
        Self {
            click_count: 2,
            ..Self::new(position)
        }
    }

    pub fn released(position: Point<Pixels>) -> Self {
        Self {
            pressed: false,
            ..Self::new(position)
        }
    }
}

impl From<&MouseDownEvent> for PointerEvent {
    fn from(event: &MouseDownEvent) -> Self {
        Self {
            position: event.position,
            click_count: event.click_count,
            pressed: true,
        }
    }
}

impl From<&MouseMoveEvent> for PointerEvent {
    fn from(event: &MouseMoveEvent) -> Self {
        Self {
            position: event.position,
            click_count: 0,
            pressed: event.pressed_button.is_some(),
        }
    }
}

impl From<&MouseUpEvent> for PointerEvent {
    fn from(event: &MouseUpEvent) -> Self {
        Self {
            position: event.position,
            click_count: event.click_count,
            pressed: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisSide {
    Left,
    Right,
}

/// Which edge strips of a surface act as its price axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisStrips {
    Left,
    Right,
    Both,
}

impl AxisStrips {
    fn has(self, side: AxisSide) -> bool {
        matches!(
            (self, side),
            (Self::Both, _) | (Self::Left, AxisSide::Left) | (Self::Right, AxisSide::Right)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Axis(AxisSide),
    Plot,
    Outside,
}

/// Where a surface sits on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceGeometry {
    /// Whole surface, axis strips included.
    pub bounds: Bounds<Pixels>,
    /// Area where the series is drawn.
    pub plot: Bounds<Pixels>,
    pub strips: AxisStrips,
}

impl SurfaceGeometry {
    pub fn hit_test(&self, position: Point<Pixels>) -> Region {
        let (x, y) = (position.x.as_f32(), position.y.as_f32());
        let top = self.plot.origin.y.as_f32();
        let bottom = top + self.plot.size.height.as_f32();
        if y < top || y > bottom {
            return Region::Outside;
        }

        let left = self.bounds.origin.x.as_f32();
        let plot_left = self.plot.origin.x.as_f32();
        let plot_right = plot_left + self.plot.size.width.as_f32();
        let right = left + self.bounds.size.width.as_f32();

        if self.strips.has(AxisSide::Left) && x >= left && x < plot_left {
            Region::Axis(AxisSide::Left)
        } else if self.strips.has(AxisSide::Right) && x > plot_right && x <= right {
            Region::Axis(AxisSide::Right)
        } else if x >= plot_left && x <= plot_right {
            Region::Plot
        } else {
            Region::Outside
        }
    }

    pub fn plot_height(&self) -> f32 {
        self.plot.size.height.as_f32()
    }
}

/// What a press on the plot area should do when no drawing tool is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotIntent {
    /// Drag moves the price scale vertically, horizontal goes to the host.
    Move,
    /// Drag only pans the host horizontally.
    Free,
    /// Press is not for this surface.
    Ignore,
}

/// Maps a pointer position to data coordinates of a surface.
pub trait DataProjector {
    fn to_data(&self, position: Point<Pixels>) -> Option<DataPoint>;
}

/// For surfaces that take no drawings.
pub struct NoProjection;

impl DataProjector for NoProjection {
    fn to_data(&self, _position: Point<Pixels>) -> Option<DataPoint> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    pub drag_threshold_px: f32,
    pub zoom_sensitivity: f64,
    pub zoom_bounds: (f64, f64),
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 3.0,
            zoom_sensitivity: 0.005,
            zoom_bounds: (0.5, 20.0),
        }
    }
}

/// Everything the classifier needs to know about a surface at press time.
pub struct GestureContext<'a> {
    pub surface: SurfaceId,
    pub geometry: SurfaceGeometry,
    /// Current price mapping, `None` while the surface has no range yet.
    pub transform: Option<AxisTransform>,
    pub plot_intent: PlotIntent,
    pub drawing: DrawingContext,
    pub projector: &'a dyn DataProjector,
    pub capture: &'a PointerCapture,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureEffect {
    /// Manual zoom/offset relative to `base`.
    SetScale {
        zoom: f64,
        offset: f64,
        base: PriceRange,
    },
    ResetScale,
    PanHost {
        dx: Pixels,
    },
    Click {
        position: Point<Pixels>,
    },
    Preview(PendingDrawing),
    CancelPreview,
    Commit {
        shape: DrawingShape,
        color: Hsla,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureResponse {
    /// The event belonged to this surface.
    pub handled: bool,
    pub effects: Vec<GestureEffect>,
}

impl GestureResponse {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled(effects: Vec<GestureEffect>) -> Self {
        Self {
            handled: true,
            effects,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Pending,
    ZoomDrag,
    MoveDrag,
    FreeDrag,
    DrawDrag,
}

#[derive(Clone, Copy, Debug)]
struct ScaleStart {
    zoom: f64,
    offset: f64,
    base: PriceRange,
    /// Pointer position as a fraction of the plot height, 0 at the top.
    pivot_ratio: f64,
    displayed_span: f64,
    plot_height: f32,
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    Zoom(ScaleStart),
    Move(ScaleStart),
    Free,
    Draw(PendingDrawing),
}

/// One press-to-release interaction. Holding it keeps the pointer captured
/// for its surface; dropping it releases the capture.
#[derive(Debug)]
pub struct InputSession {
    surface: SurfaceId,
    mode: Mode,
    dragging: bool,
    start: Point<Pixels>,
    last: Point<Pixels>,
    _capture: CaptureGuard,
}

impl InputSession {
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn phase(&self) -> GesturePhase {
        match self.mode {
            Mode::Draw(_) => GesturePhase::DrawDrag,
            _ if !self.dragging => GesturePhase::Pending,
            Mode::Zoom(_) => GesturePhase::ZoomDrag,
            Mode::Move(_) => GesturePhase::MoveDrag,
            Mode::Free => GesturePhase::FreeDrag,
        }
    }
}

/// Gesture state machine of one surface.
#[derive(Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    session: Option<InputSession>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.session
            .as_ref()
            .map_or(GesturePhase::Idle, InputSession::phase)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InputSession> {
        self.session.as_ref()
    }

    pub fn pointer_down(&mut self, event: PointerEvent, ctx: GestureContext<'_>) -> GestureResponse {
        // A press without a matching release (lost outside the window) ends
        // the previous session first.
        self.session = None;

        let position = event.position;
        match ctx.geometry.hit_test(position) {
            Region::Outside => GestureResponse::ignored(),
            Region::Axis(_) if event.click_count >= 2 => {
                debug!(surface = %ctx.surface, "price scale reset");
                GestureResponse::handled(vec![GestureEffect::ResetScale])
            }
            Region::Axis(_) => {
                if let Some(transform) = ctx.transform {
                    let start = scale_start(&transform, position, &ctx.geometry);
                    self.begin(ctx.surface, Mode::Zoom(start), position, ctx.capture);
                }
                GestureResponse::handled(Vec::new())
            }
            Region::Plot => match ctx.drawing.tool {
                Some(tool) => {
                    let Some(point) = ctx.projector.to_data(position) else {
                        return GestureResponse::ignored();
                    };
                    if tool.is_one_shot() {
                        let shape = DrawingShape::from_tool(tool, point, point);
                        return GestureResponse::handled(vec![GestureEffect::Commit {
                            shape,
                            color: ctx.drawing.color,
                        }]);
                    }
                    let pending = PendingDrawing {
                        tool,
                        start: point,
                        current: point,
                        color: ctx.drawing.color,
                    };
                    self.begin(ctx.surface, Mode::Draw(pending), position, ctx.capture);
                    GestureResponse::handled(vec![GestureEffect::Preview(pending)])
                }
                None => {
                    let mode = match (ctx.plot_intent, ctx.transform) {
                        (PlotIntent::Ignore, _) => return GestureResponse::ignored(),
                        (PlotIntent::Move, Some(transform)) => {
                            Mode::Move(scale_start(&transform, position, &ctx.geometry))
                        }
                        _ => Mode::Free,
                    };
                    self.begin(ctx.surface, mode, position, ctx.capture);
                    GestureResponse::handled(Vec::new())
                }
            },
        }
    }

    pub fn pointer_move(
        &mut self,
        event: PointerEvent,
        projector: &dyn DataProjector,
    ) -> GestureResponse {
        if !event.pressed && self.session.is_some() {
            return self.pointer_up(event, projector);
        }
        let threshold = self.config.drag_threshold_px;
        let (sensitivity, bounds) = (self.config.zoom_sensitivity, self.config.zoom_bounds);
        let Some(session) = self.session.as_mut() else {
            return GestureResponse::ignored();
        };

        let position = event.position;
        let dx_total = (position.x - session.start.x).as_f32();
        let dy_total = (position.y - session.start.y).as_f32();

        if !session.dragging {
            if dx_total.hypot(dy_total) <= threshold {
                return GestureResponse::handled(Vec::new());
            }
            session.dragging = true;
        }

        let step_dx = position.x - session.last.x;
        session.last = position;

        let mut effects = Vec::new();
        match &mut session.mode {
            Mode::Zoom(start) => {
                let zoom = ViewController::drag_zoom(start.zoom, -dy_total, sensitivity, bounds);
                let offset = ViewController::pivot_offset(
                    start.offset,
                    start.base.span(),
                    start.zoom,
                    zoom,
                    start.pivot_ratio,
                );
                effects.push(GestureEffect::SetScale {
                    zoom,
                    offset,
                    base: start.base,
                });
            }
            Mode::Move(start) => {
                let offset = ViewController::move_offset(
                    start.offset,
                    dy_total,
                    start.displayed_span,
                    start.plot_height,
                );
                effects.push(GestureEffect::SetScale {
                    zoom: start.zoom,
                    offset,
                    base: start.base,
                });
                if step_dx.as_f32() != 0.0 {
                    effects.push(GestureEffect::PanHost { dx: step_dx });
                }
            }
            Mode::Free => {
                if step_dx.as_f32() != 0.0 {
                    effects.push(GestureEffect::PanHost { dx: step_dx });
                }
            }
            Mode::Draw(pending) => {
                if let Some(point) = projector.to_data(position) {
                    pending.current = point;
                }
                effects.push(GestureEffect::Preview(*pending));
            }
        }
        GestureResponse::handled(effects)
    }

    pub fn pointer_up(&mut self, event: PointerEvent, projector: &dyn DataProjector) -> GestureResponse {
        let Some(session) = self.session.take() else {
            return GestureResponse::ignored();
        };

        let effects = match session.mode {
            Mode::Draw(pending) => {
                let mut effects = vec![GestureEffect::CancelPreview];
                if session.dragging || moved_past(&session, event.position, self.config.drag_threshold_px) {
                    let end = projector.to_data(event.position).unwrap_or(pending.current);
                    effects.push(GestureEffect::Commit {
                        shape: DrawingShape::from_tool(pending.tool, pending.start, end),
                        color: pending.color,
                    });
                }
                effects
            }
            _ if !session.dragging => vec![GestureEffect::Click {
                position: session.start,
            }],
            _ => Vec::new(),
        };
        GestureResponse::handled(effects)
    }

    /// Drops the current session, if any. A pending drawing is discarded.
    pub fn cancel(&mut self) -> GestureResponse {
        match self.session.take() {
            Some(session) => {
                debug!(surface = %session.surface, "gesture cancelled");
                let effects = match session.mode {
                    Mode::Draw(_) => vec![GestureEffect::CancelPreview],
                    _ => Vec::new(),
                };
                GestureResponse::handled(effects)
            }
            None => GestureResponse::ignored(),
        }
    }

    fn begin(
        &mut self,
        surface: SurfaceId,
        mode: Mode,
        position: Point<Pixels>,
        capture: &PointerCapture,
    ) {
        self.session = Some(InputSession {
            surface,
            mode,
            dragging: false,
            start: position,
            last: position,
            _capture: capture.capture(surface),
        });
    }
}

fn scale_start(transform: &AxisTransform, position: Point<Pixels>, geometry: &SurfaceGeometry) -> ScaleStart {
    ScaleStart {
        zoom: transform.zoom(),
        offset: transform.offset(),
        base: transform.base(),
        pivot_ratio: transform.ratio_at(position.y.as_f32()),
        displayed_span: transform.displayed_span(),
        plot_height: geometry.plot_height(),
    }
}

fn moved_past(session: &InputSession, position: Point<Pixels>, threshold: f32) -> bool {
    let dx = (position.x - session.start.x).as_f32();
    let dy = (position.y - session.start.y).as_f32();
    dx.hypot(dy) > threshold
}
