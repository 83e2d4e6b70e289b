//! Symbol overlays drawn over the host plot with their own price scale.

use crate::alignment::align_time;
use crate::config::EngineConfig;
use crate::data_types::{
    CandleStyle, DrawingContext, OverlayDisplay, OverlayId, OverlaySettings, OverlaySnapshot,
    SourceRef, Timeframe,
};
use crate::error::{OverlayError, Result};
use crate::gesture::{
    AxisSide, AxisStrips, GestureContext, GestureEffect, GestureResponse, NoProjection, PlotIntent,
    PointerEvent, Region, SurfaceGeometry,
};
use crate::host::{HostChart, PointerCapture, VisibleWindow};
use crate::ingest::{CandleSource, RawHistory};
use crate::plot_types::{overlay_painter, SeriesPainter};
use crate::registry::{PendingAdd, SurfaceCore, SurfaceEntity, SurfaceRegistry};
use crate::rendering::{SurfaceFrame, SurfaceReport};
use crate::sync::{render_surface, RenderContext, SurfacePlacement, SurfaceView};
use crate::utils::{BoundsExt, PixelsExt};
use gpui::{Bounds, Pixels, Point};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Overlay {
    id: OverlayId,
    pub core: SurfaceCore,
    pub selected: bool,
    pub display: OverlayDisplay,
    pub line_width: f32,
    pub candle_style: CandleStyle,
}

impl Overlay {
    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.core.source
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            id: self.id,
            source: self.core.source.clone(),
            color: self.core.color,
            visible: self.core.visible,
            display: self.display,
            line_width: self.line_width,
            candle_style: self.candle_style.clone(),
            price_zoom: self.core.scale.zoom,
            price_offset: self.core.scale.offset,
        }
    }

    fn apply(&mut self, patch: &OverlaySettings) -> Result<()> {
        if let Some(width) = patch.line_width {
            if !(width > 0.0 && width.is_finite()) {
                return Err(OverlayError::InvalidSettings(format!(
                    "line width must be positive, got {width}"
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
        if let Some(style) = &patch.candle_style {
            self.candle_style = style.clone();
        }
        Ok(())
    }

    /// Whether `position` is close enough to this overlay's series to grab it.
    fn hit(&self, host: &dyn HostChart, position: Point<Pixels>, config: &EngineConfig) -> bool {
        let plot = host.plot_bounds();
        if !plot.contains(&position) {
            return false;
        }
        let Some(window) = VisibleWindow::from_host(host) else {
            return false;
        };
        let Some(transform) = self.core.current_transform(host, plot, config.range_padding) else {
            return false;
        };
        let host_index = host.pixel_to_data_index(position.x).round();
        if host_index < 0.0 {
            return false;
        }
        let Some(t) = host.candle_time(host_index as usize) else {
            return false;
        };
        // Same half-bar tolerance the renderer aligns with.
        let candles = self.core.visible_candles(Some(&window));
        let Some(candle) = candles
            .len()
            .checked_sub(1)
            .and_then(|last| align_time(candles, 0..=last, t, host.timeframe()))
            .and_then(|index| candles.get(index))
        else {
            return false;
        };

        let y = position.y.as_f32();
        let tolerance = config.overlay_hit_tolerance_px;
        match self.display {
            OverlayDisplay::Line => (transform.price_to_y(candle.c) - y).abs() <= tolerance,
            OverlayDisplay::Candles => {
                let top = transform.price_to_y(candle.h) - tolerance;
                let bottom = transform.price_to_y(candle.l) + tolerance;
                (top..=bottom).contains(&y)
            }
        }
    }
}

impl SurfaceEntity for Overlay {
    type Id = OverlayId;

    fn id(&self) -> OverlayId {
        self.id
    }

    fn core(&self) -> &SurfaceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }
}

impl SurfaceView for Overlay {
    fn painter(&self) -> Box<dyn SeriesPainter> {
        overlay_painter(self.display, self.core.color, self.line_width, &self.candle_style)
    }
}

/// Owns every overlay of the host chart.
pub struct OverlayManager {
    registry: SurfaceRegistry<Overlay>,
    config: EngineConfig,
}

impl OverlayManager {
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

    /// Registers the overlay once its fetch resolved. A failed fetch leaves
    /// the manager untouched.
    pub fn complete_add(
        &mut self,
        pending: PendingAdd,
        fetched: eyre::Result<RawHistory>,
        timeframe: Timeframe,
    ) -> Result<OverlayId> {
        let source = pending.source().clone();
        let history = match fetched {
            Ok(history) => history,
            Err(err) => {
                warn!(%source, error = %err, "overlay fetch failed");
                return Err(OverlayError::FetchFailure {
                    source_ref: source,
                    reason: format!("{err:#}"),
                });
            }
        };
        drop(pending);

        let raw = history.into_candles();
        let (id, color) = self.registry.allocate();
        let id = OverlayId(id);
        let core = SurfaceCore::new(source.clone(), color, raw, timeframe, self.config.gesture());
        if core.parse_failed() {
            warn!(%source, "overlay source has no valid OHLC rows");
        }
        self.registry.insert(Overlay {
            id,
            core,
            selected: false,
            display: OverlayDisplay::default(),
            line_width: 1.5,
            candle_style: CandleStyle::default(),
        });
        Ok(id)
    }

    /// Fetches synchronously through `source` and registers the result.
    pub fn add(
        &mut self,
        source_ref: impl Into<SourceRef>,
        source: &dyn CandleSource,
        timeframe: Timeframe,
    ) -> Result<OverlayId> {
        let pending = self.begin_add(source_ref)?;
        let fetched = source.fetch(pending.source());
        self.complete_add(pending, fetched, timeframe)
    }

    pub fn remove(&mut self, id: OverlayId) -> Result<()> {
        self.registry
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| OverlayError::UnknownSurface(id.to_string()))
    }

    pub fn set_visible(&mut self, id: OverlayId, visible: bool) -> Result<()> {
        let overlay = self.registry.require_mut(id)?;
        overlay.core.visible = visible;
        if !visible {
            overlay.selected = false;
            overlay.core.gesture_mut().cancel();
        }
        Ok(())
    }

    pub fn apply_settings(&mut self, id: OverlayId, patch: &OverlaySettings) -> Result<()> {
        self.registry.require_mut(id)?.apply(patch)
    }

    /// Selects `id` and deselects every other overlay; `None` clears.
    pub fn select(&mut self, id: Option<OverlayId>) {
        for overlay in self.registry.iter_mut() {
            overlay.selected = Some(overlay.id) == id;
        }
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.registry.iter().find(|o| o.selected).map(|o| o.id)
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> usize {
        self.registry.set_timeframe(timeframe)
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.registry.get(id)
    }

    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.registry.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
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

    pub fn snapshots(&self) -> Vec<OverlaySnapshot> {
        self.registry.iter().map(Overlay::snapshot).collect()
    }

    /// Re-applies persisted state onto the registered overlay with the same
    /// source.
    pub fn restore(&mut self, snapshot: &OverlaySnapshot) -> Result<OverlayId> {
        let overlay = self
            .registry
            .iter_mut()
            .find(|o| o.core.source == snapshot.source)
            .ok_or_else(|| OverlayError::UnknownSurface(snapshot.source.to_string()))?;
        overlay.core.color = snapshot.color;
        overlay.core.visible = snapshot.visible;
        overlay.display = snapshot.display;
        overlay.line_width = snapshot.line_width;
        overlay.candle_style = snapshot.candle_style.clone();
        let manual = snapshot.price_zoom != 1.0 || snapshot.price_offset != 0.0;
        let zoom = self.config.clamp_zoom(snapshot.price_zoom);
        overlay
            .core
            .scale
            .restore(zoom, snapshot.price_offset, !manual);
        Ok(overlay.id)
    }

    /// The overlay whose scale the left axis shows: the selected one, else
    /// the last visible one.
    pub fn axis_owner(&self) -> Option<OverlayId> {
        let visible = || self.registry.iter().filter(|o| o.core.visible);
        visible()
            .find(|o| o.selected)
            .or_else(|| visible().last())
            .map(|o| o.id)
    }

    pub fn geometry(host: &dyn HostChart) -> SurfaceGeometry {
        SurfaceGeometry {
            bounds: host.chart_bounds(),
            plot: host.plot_bounds(),
            strips: AxisStrips::Left,
        }
    }

    fn axis_strip(host: &dyn HostChart) -> Bounds<Pixels> {
        host.chart_bounds().strip_left_of(&host.plot_bounds())
    }

    pub fn has_active_gesture(&self) -> bool {
        self.registry.iter().any(|o| o.core.gesture().is_active())
    }

    /// Offers a press to the overlays, topmost (last added) first.
    pub fn pointer_down(
        &mut self,
        event: PointerEvent,
        host: &mut dyn HostChart,
        capture: &PointerCapture,
    ) -> GestureResponse {
        let geometry = Self::geometry(host);
        let plot = geometry.plot;
        let owner = self.axis_owner();

        // The axis strip belongs to the overlay it currently displays.
        let candidates: Vec<OverlayId> = match geometry.hit_test(event.position) {
            Region::Axis(_) => owner.into_iter().collect(),
            Region::Plot => self
                .registry
                .iter()
                .rev()
                .filter(|o| o.core.visible)
                .map(|o| o.id)
                .collect(),
            Region::Outside => Vec::new(),
        };

        for id in candidates {
            let config = &self.config;
            let Some(overlay) = self.registry.get_mut(id) else {
                continue;
            };
            let intent = if overlay.selected {
                PlotIntent::Move
            } else if overlay.hit(host, event.position, config) {
                PlotIntent::Free
            } else {
                PlotIntent::Ignore
            };
            let transform = overlay.core.current_transform(host, plot, config.range_padding);
            let response = overlay.core.gesture_mut().pointer_down(
                event,
                GestureContext {
                    surface: id.into(),
                    geometry,
                    transform,
                    plot_intent: intent,
                    drawing: DrawingContext::none(),
                    projector: &NoProjection,
                    capture,
                },
            );
            if response.handled {
                let effects = response.effects.clone();
                self.apply(id, effects, host);
                return response;
            }
        }
        GestureResponse::ignored()
    }

    pub fn pointer_move(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        self.route(host, |overlay| overlay.core.gesture_mut().pointer_move(event, &NoProjection))
    }

    pub fn pointer_up(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        self.route(host, |overlay| overlay.core.gesture_mut().pointer_up(event, &NoProjection))
    }

    fn route(
        &mut self,
        host: &mut dyn HostChart,
        mut step: impl FnMut(&mut Overlay) -> GestureResponse,
    ) -> GestureResponse {
        let Some(id) = self
            .registry
            .iter()
            .find(|o| o.core.gesture().is_active())
            .map(|o| o.id)
        else {
            return GestureResponse::ignored();
        };
        let Some(overlay) = self.registry.get_mut(id) else {
            return GestureResponse::ignored();
        };
        let response = step(overlay);
        self.apply(id, response.effects.clone(), host);
        response
    }

    fn apply(&mut self, id: OverlayId, effects: Vec<GestureEffect>, host: &mut dyn HostChart) {
        let Some(overlay) = self.registry.get_mut(id) else {
            return;
        };
        let rest = overlay.core.apply_effects(effects, host);
        let clicked = rest
            .iter()
            .any(|e| matches!(e, GestureEffect::Click { .. }));
        if clicked {
            let select = !overlay.selected;
            debug!(%id, select, "overlay selection toggled");
            self.select(select.then_some(id));
        }
    }

    /// Renders every visible overlay for this frame.
    pub fn render(&mut self, ctx: &RenderContext<'_>) -> Vec<(SurfaceFrame, SurfaceReport)> {
        let host = ctx.host;
        let timeframe = host.timeframe();
        let owner = self.axis_owner();
        let bounds = host.chart_bounds();
        let plot = host.plot_bounds();
        let strip = Self::axis_strip(host);

        let mut out = Vec::new();
        let mut row = 0usize;
        for overlay in self.registry.iter_mut() {
            overlay.core.ensure_timeframe(timeframe);
            if !overlay.core.visible {
                continue;
            }
            let placement = SurfacePlacement {
                bounds,
                plot,
                axis_strip: strip,
                axis_side: AxisSide::Left,
                draw_axis: Some(overlay.id) == owner,
                legend_row: row,
            };
            row += 2;
            out.push(render_surface(overlay, &placement, ctx));
        }
        out
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
