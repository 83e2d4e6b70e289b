//! Linked panes: chart surfaces stacked below the host, sharing its time
//! axis, each with its own price scale, style, drawings and crosshair.

use crate::config::EngineConfig;
use crate::data_types::{
    CandleStyle, DrawingContext, DrawingId, DrawingShape, PaneDisplay, PaneId, PaneSettings,
    PaneSnapshot, PendingDrawing, SourceRef, Timeframe,
};
use crate::drawing_store::{DrawingStore, Projection};
use crate::error::{OverlayError, Result};
use crate::gesture::{
    AxisSide, AxisStrips, DataProjector, GestureContext, GestureEffect, GestureResponse,
    NoProjection, PlotIntent, PointerEvent, SurfaceGeometry,
};
use crate::host::{HostChart, PointerCapture};
use crate::ingest::{CandleSource, RawHistory};
use crate::plot_types::{pane_painter, SeriesPainter};
use crate::registry::{PendingAdd, SurfaceCore, SurfaceEntity, SurfaceRegistry};
use crate::rendering::{SurfaceFrame, SurfaceReport};
use crate::sync::{render_surface, RenderContext, SurfacePlacement, SurfaceView};
use crate::transform::AxisTransform;
use crate::utils::{BoundsExt, PixelsExt};
use crate::view_controller::ViewController;
use gpui::{point, px, size, Bounds, Hsla, Pixels, Point};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct LinkedPane {
    id: PaneId,
    pub core: SurfaceCore,
    pub display: PaneDisplay,
    pub line_width: f32,
    pub area_opacity: f32,
    pub candle_style: CandleStyle,
    /// Fraction of the host chart height.
    pub height: f32,
    pub drawings: DrawingStore,
    pub pending: Option<PendingDrawing>,
    pub crosshair: Option<Point<Pixels>>,
}

impl LinkedPane {
    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.core.source
    }

    pub fn snapshot(&self) -> PaneSnapshot {
        PaneSnapshot {
            id: self.id,
            source: self.core.source.clone(),
            color: self.core.color,
            visible: self.core.visible,
            display: self.display,
            line_width: self.line_width,
            area_opacity: self.area_opacity,
            candle_style: self.candle_style.clone(),
            height: self.height,
            auto_scale: self.core.scale.auto_scale,
            price_zoom: self.core.scale.zoom,
            price_offset: self.core.scale.offset,
            drawings: self.drawings.iter().cloned().collect(),
        }
    }

    fn apply(&mut self, patch: &PaneSettings, min_height: f32) -> Result<()> {
        if let Some(width) = patch.line_width {
            if !(width > 0.0 && width.is_finite()) {
                return Err(OverlayError::InvalidSettings(format!(
                    "line width must be positive, got {width}"
                )));
            }
        }
        if let Some(opacity) = patch.area_opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(OverlayError::InvalidSettings(format!(
                    "area opacity must be within [0, 1], got {opacity}"
                )));
            }
        }
        if let Some(height) = patch.height {
            if !(height >= min_height && height.is_finite()) {
                return Err(OverlayError::InvalidSettings(format!(
                    "pane height must be at least {min_height}, got {height}"
                )));
            }
        }

        if let Some(color) = patch.color {
            self.core.color = color;
        }
        if let Some(visible) = patch.visible {
            self.core.visible = visible;
        }
        if let Some(display) = patch.display {
            self.display = display;
        }
        if let Some(width) = patch.line_width {
            self.line_width = width;
        }
        if let Some(opacity) = patch.area_opacity {
            self.area_opacity = opacity;
        }
        if let Some(style) = &patch.candle_style {
            self.candle_style = style.clone();
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(auto_scale) = patch.auto_scale {
            self.core.scale.set_auto(auto_scale);
        }
        Ok(())
    }

    fn handle(&mut self, effects: Vec<GestureEffect>) {
        for effect in effects {
            match effect {
                GestureEffect::Preview(pending) => self.pending = Some(pending),
                GestureEffect::CancelPreview => self.pending = None,
                GestureEffect::Commit { shape, color } => {
                    let id = self.drawings.add(shape, color);
                    debug!(pane = %self.id, drawing = id.0, tool = ?shape.tool(), "drawing committed");
                }
                _ => {}
            }
        }
    }
}

impl SurfaceEntity for LinkedPane {
    type Id = PaneId;

    fn id(&self) -> PaneId {
        self.id
    }

    fn core(&self) -> &SurfaceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }
}

impl SurfaceView for LinkedPane {
    fn painter(&self) -> Box<dyn SeriesPainter> {
        pane_painter(
            self.display,
            self.core.color,
            self.line_width,
            self.area_opacity,
            &self.candle_style,
        )
    }

    fn drawings(&self) -> Option<&DrawingStore> {
        Some(&self.drawings)
    }

    fn pending_drawing(&self) -> Option<&PendingDrawing> {
        self.pending.as_ref()
    }

    fn crosshair(&self) -> Option<Point<Pixels>> {
        self.crosshair
    }
}

/// Owns the panes stacked below the host chart, top to bottom in insertion
/// order.
pub struct LinkedPaneManager {
    registry: SurfaceRegistry<LinkedPane>,
    config: EngineConfig,
}

impl LinkedPaneManager {
    pub fn new(config: EngineConfig) -> eyre::Result<Self> {
        let palette = config.palette_colors()?;
        Ok(Self {
            registry: SurfaceRegistry::new(palette),
            config,
        })
    }

    pub fn begin_add(&self, source: impl Into<SourceRef>) -> Result<PendingAdd> {
        self.registry.begin_add(source.into())
    }

    /// Registers the pane once its fetch resolved. A failed fetch leaves the
    /// manager untouched; an unparseable history still creates an empty pane.
    pub fn complete_add(
        &mut self,
        pending: PendingAdd,
        fetched: eyre::Result<RawHistory>,
        timeframe: Timeframe,
    ) -> Result<PaneId> {
        let source = pending.source().clone();
        let history = match fetched {
            Ok(history) => history,
            Err(err) => {
                warn!(%source, error = %err, "pane fetch failed");
                return Err(OverlayError::FetchFailure {
                    source_ref: source,
                    reason: format!("{err:#}"),
                });
            }
        };
        drop(pending);

        let raw = history.into_candles();
        let (id, color) = self.registry.allocate();
        let id = PaneId(id);
        let core = SurfaceCore::new(source.clone(), color, raw, timeframe, self.config.gesture());
        if core.parse_failed() {
            warn!(%source, "pane source has no valid OHLC rows");
        }
        self.registry.insert(LinkedPane {
            id,
            core,
            display: PaneDisplay::default(),
            line_width: 1.5,
            area_opacity: 0.2,
            candle_style: CandleStyle::default(),
            height: self.config.default_pane_height,
            drawings: DrawingStore::new(),
            pending: None,
            crosshair: None,
        });
        Ok(id)
    }

    pub fn add(
        &mut self,
        source_ref: impl Into<SourceRef>,
        source: &dyn CandleSource,
        timeframe: Timeframe,
    ) -> Result<PaneId> {
        let pending = self.begin_add(source_ref)?;
        let fetched = source.fetch(pending.source());
        self.complete_add(pending, fetched, timeframe)
    }

    pub fn remove(&mut self, id: PaneId) -> Result<()> {
        self.registry
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| OverlayError::UnknownSurface(id.to_string()))
    }

    pub fn set_visible(&mut self, id: PaneId, visible: bool) -> Result<()> {
        let pane = self.registry.require_mut(id)?;
        pane.core.visible = visible;
        if !visible {
            pane.core.gesture_mut().cancel();
            pane.pending = None;
            pane.crosshair = None;
        }
        Ok(())
    }

    pub fn apply_settings(&mut self, id: PaneId, patch: &PaneSettings) -> Result<()> {
        let min_height = self.config.min_pane_height;
        self.registry.require_mut(id)?.apply(patch, min_height)
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> usize {
        self.registry.set_timeframe(timeframe)
    }

    pub fn get(&self, id: PaneId) -> Option<&LinkedPane> {
        self.registry.get(id)
    }

    pub fn get_mut(&mut self, id: PaneId) -> Option<&mut LinkedPane> {
        self.registry.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkedPane> {
        self.registry.iter()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn is_pending(&self, source: &SourceRef) -> bool {
        self.registry.is_in_flight(source)
    }

    pub fn snapshots(&self) -> Vec<PaneSnapshot> {
        self.registry.iter().map(LinkedPane::snapshot).collect()
    }

    /// Re-applies persisted state, drawings included, onto the registered
    /// pane with the same source.
    pub fn restore(&mut self, snapshot: &PaneSnapshot) -> Result<PaneId> {
        let min_height = self.config.min_pane_height;
        let zoom = self.config.clamp_zoom(snapshot.price_zoom);
        let pane = self
            .registry
            .iter_mut()
            .find(|p| p.core.source == snapshot.source)
            .ok_or_else(|| OverlayError::UnknownSurface(snapshot.source.to_string()))?;
        pane.core.color = snapshot.color;
        pane.core.visible = snapshot.visible;
        pane.display = snapshot.display;
        pane.line_width = snapshot.line_width;
        pane.area_opacity = snapshot.area_opacity.clamp(0.0, 1.0);
        pane.candle_style = snapshot.candle_style.clone();
        pane.height = snapshot.height.max(min_height);
        pane.core
            .scale
            .restore(zoom, snapshot.price_offset, snapshot.auto_scale);
        pane.drawings.clear();
        for drawing in &snapshot.drawings {
            pane.drawings.insert(drawing.clone());
        }
        Ok(pane.id)
    }

    pub fn add_drawing(&mut self, id: PaneId, shape: DrawingShape, color: Hsla) -> Result<DrawingId> {
        Ok(self.registry.require_mut(id)?.drawings.add(shape, color))
    }

    pub fn remove_drawing(&mut self, id: PaneId, drawing: DrawingId) -> Result<bool> {
        Ok(self.registry.require_mut(id)?.drawings.remove(drawing).is_some())
    }

    pub fn clear_drawings(&mut self, id: PaneId) -> Result<()> {
        self.registry.require_mut(id)?.drawings.clear();
        Ok(())
    }

    /// Bounds of every visible pane, stacked directly below the host chart.
    pub fn layout(&self, host: &dyn HostChart) -> Vec<(PaneId, Bounds<Pixels>)> {
        let chart = host.chart_bounds();
        let chart_height = chart.size.height.as_f32();
        let mut y = (chart.origin.y + chart.size.height).as_f32();
        self.registry
            .iter()
            .filter(|p| p.core.visible)
            .map(|p| {
                let h = p.height * chart_height;
                let bounds = Bounds::new(
                    point(chart.origin.x, px(y)),
                    size(chart.size.width, px(h)),
                );
                y += h;
                (p.id, bounds)
            })
            .collect()
    }

    /// Total height the visible panes take below the host.
    pub fn stack_height(&self, host: &dyn HostChart) -> Pixels {
        self.layout(host)
            .iter()
            .fold(px(0.0), |acc, (_, b)| acc + b.size.height)
    }

    /// Plot area and axis strips of a pane, using the host's side margins.
    pub fn geometry(host: &dyn HostChart, bounds: Bounds<Pixels>) -> SurfaceGeometry {
        let margins = host.margins();
        SurfaceGeometry {
            bounds,
            plot: bounds.inset_x(margins.left, margins.right),
            strips: AxisStrips::Both,
        }
    }

    /// Moves the bottom edge of the `index`-th visible pane by `delta` pixels.
    /// Between two panes the pair keeps its combined height; the last pane
    /// simply grows or shrinks.
    pub fn resize(&mut self, index: usize, delta: Pixels, host: &dyn HostChart) {
        let chart_height = host.chart_bounds().size.height.as_f32();
        let min = self.config.min_pane_height;
        let mut visible: Vec<&mut LinkedPane> =
            self.registry.iter_mut().filter(|p| p.core.visible).collect();
        if index >= visible.len() {
            return;
        }

        if index + 1 < visible.len() {
            let mut weights: Vec<f32> = visible.iter().map(|p| p.height).collect();
            ViewController::resize_panes(&mut weights, index, delta.as_f32(), chart_height, min);
            for (pane, weight) in visible.iter_mut().zip(weights) {
                pane.height = weight;
            }
        } else {
            let pane = &mut visible[index];
            pane.height = ViewController::resize_single(pane.height, delta.as_f32(), chart_height, min);
        }
    }

    /// Pane whose bounds contain `position`.
    pub fn pane_at(&self, host: &dyn HostChart, position: Point<Pixels>) -> Option<PaneId> {
        self.layout(host)
            .into_iter()
            .find(|(_, b)| b.contains(&position))
            .map(|(id, _)| id)
    }

    /// Moves the crosshair to the pane under the pointer and clears it
    /// elsewhere. Returns whether anything changed.
    pub fn hover(&mut self, host: &dyn HostChart, position: Option<Point<Pixels>>) -> bool {
        let layout = self.layout(host);
        let mut changed = false;
        for pane in self.registry.iter_mut() {
            let next = position.filter(|p| {
                layout
                    .iter()
                    .find(|(id, _)| *id == pane.id)
                    .map(|(_, b)| Self::geometry(host, *b).plot.contains(p))
                    .unwrap_or(false)
            });
            if pane.crosshair != next {
                pane.crosshair = next;
                changed = true;
            }
        }
        changed
    }

    pub fn has_active_gesture(&self) -> bool {
        self.registry.iter().any(|p| p.core.gesture().is_active())
    }

    pub fn pointer_down(
        &mut self,
        event: PointerEvent,
        host: &mut dyn HostChart,
        drawing: DrawingContext,
        capture: &PointerCapture,
    ) -> GestureResponse {
        let Some((id, bounds)) = self
            .layout(host)
            .into_iter()
            .find(|(_, b)| b.contains(&event.position))
        else {
            return GestureResponse::ignored();
        };
        let geometry = Self::geometry(host, bounds);
        let padding = self.config.range_padding;
        let Some(pane) = self.registry.get_mut(id) else {
            return GestureResponse::ignored();
        };

        let transform = pane.core.current_transform(host, geometry.plot, padding);
        let intent = if pane.core.scale.is_manual() {
            PlotIntent::Move
        } else {
            PlotIntent::Free
        };
        let (gesture, candles) = pane.core.gesture_and_candles();
        let projection = transform.map(|t| Projection::new(host, candles, t, geometry.plot));
        let projector: &dyn DataProjector = match &projection {
            Some(p) => p,
            None => &NoProjection,
        };
        let response = gesture.pointer_down(
            event,
            GestureContext {
                surface: id.into(),
                geometry,
                transform,
                plot_intent: intent,
                drawing,
                projector,
                capture,
            },
        );
        drop(projection);
        if response.handled {
            self.apply(id, response.effects.clone(), host);
        }
        response
    }

    pub fn pointer_move(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        self.route(event, host, false)
    }

    pub fn pointer_up(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        self.route(event, host, true)
    }

    fn route(&mut self, event: PointerEvent, host: &mut dyn HostChart, release: bool) -> GestureResponse {
        let Some(id) = self
            .registry
            .iter()
            .find(|p| p.core.gesture().is_active())
            .map(|p| p.id)
        else {
            return GestureResponse::ignored();
        };
        let plot = self
            .layout(host)
            .into_iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, b)| Self::geometry(host, b).plot);
        let padding = self.config.range_padding;
        let Some(pane) = self.registry.get_mut(id) else {
            return GestureResponse::ignored();
        };

        let transform: Option<AxisTransform> =
            plot.and_then(|plot| pane.core.current_transform(host, plot, padding));
        let (gesture, candles) = pane.core.gesture_and_candles();
        let projection = match (transform, plot) {
            (Some(t), Some(plot)) => Some(Projection::new(host, candles, t, plot)),
            _ => None,
        };
        let projector: &dyn DataProjector = match &projection {
            Some(p) => p,
            None => &NoProjection,
        };
        let response = if release {
            gesture.pointer_up(event, projector)
        } else {
            gesture.pointer_move(event, projector)
        };
        drop(projection);
        self.apply(id, response.effects.clone(), host);
        response
    }

    fn apply(&mut self, id: PaneId, effects: Vec<GestureEffect>, host: &mut dyn HostChart) {
        if let Some(pane) = self.registry.get_mut(id) {
            let rest = pane.core.apply_effects(effects, host);
            pane.handle(rest);
        }
    }

    /// Renders every visible pane for this frame.
    pub fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<(SurfaceFrame, SurfaceReport)> {
        let host = ctx.host;
        let timeframe = host.timeframe();
        let layout = self.layout(host);

        let mut out = Vec::new();
        for pane in self.registry.iter_mut() {
            pane.core.ensure_timeframe(timeframe);
            let Some((_, bounds)) = layout.iter().find(|(id, _)| *id == pane.id) else {
                continue;
            };
            let geometry = Self::geometry(host, *bounds);
            let placement = SurfacePlacement {
                bounds: *bounds,
                plot: geometry.plot,
                axis_strip: geometry.bounds.strip_right_of(&geometry.plot),
                axis_side: AxisSide::Right,
                draw_axis: true,
                legend_row: 0,
            };
            out.push(render_surface(pane, &placement, ctx));
        }
        out
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
