//! Keeps every overlay and pane in step with the host chart's frames.
//!
//! The host notifies its [`RedrawHub`] after each of its own frames; the
//! synchronizer only marks itself dirty there, so a burst of scroll events
//! collapses into one render on the next [`RenderSynchronizer::take_frame`].

use crate::config::EngineConfig;
use crate::data_types::{Candle, PendingDrawing, SurfaceId};
use crate::drawing_store::{DrawingStore, Projection};
use crate::gesture::AxisSide;
use crate::host::{HostChart, RedrawHub, Subscription, VisibleWindow};
use crate::linked_pane::LinkedPaneManager;
use crate::overlay::OverlayManager;
use crate::plot_types::{PaintContext, ProjectedCandle, SeriesPainter};
use crate::registry::{plot_span, SurfaceEntity};
use crate::rendering::{
    format_price, paint_axis, paint_crosshair, paint_legend, paint_price_tag, Frame, Layer,
    SurfaceDiagnostic, SurfaceFrame, SurfaceReport,
};
use crate::theme::ChartTheme;
use crate::utils::date_formatter::{format_for, format_timestamp_ms};
use crate::utils::PixelsExt;
use gpui::{px, Bounds, Hsla, Pixels, Point};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// What the synchronizer needs from an overlay or pane beyond its core.
pub trait SurfaceView: SurfaceEntity {
    fn painter(&self) -> Box<dyn SeriesPainter>;

    fn drawings(&self) -> Option<&DrawingStore> {
        None
    }

    fn pending_drawing(&self) -> Option<&PendingDrawing> {
        None
    }

    fn crosshair(&self) -> Option<Point<Pixels>> {
        None
    }
}

/// Where a surface is painted this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePlacement {
    pub bounds: Bounds<Pixels>,
    pub plot: Bounds<Pixels>,
    pub axis_strip: Bounds<Pixels>,
    pub axis_side: AxisSide,
    /// Only one overlay shows its ticks on a shared strip.
    pub draw_axis: bool,
    /// Legend lines already used above this surface's legend.
    pub legend_row: usize,
}

pub struct RenderContext<'a> {
    pub host: &'a dyn HostChart,
    pub window: Option<VisibleWindow>,
    pub config: &'a EngineConfig,
    pub theme: &'a ChartTheme,
}

impl<'a> RenderContext<'a> {
    pub fn new(host: &'a dyn HostChart, config: &'a EngineConfig, theme: &'a ChartTheme) -> Self {
        Self {
            host,
            window: VisibleWindow::from_host(host),
            config,
            theme,
        }
    }
}

/// Renders one surface: clipped series, axis, price tag, clipped drawings,
/// crosshair, legend.
pub fn render_surface<V: SurfaceView + ?Sized>(
    view: &mut V,
    placement: &SurfacePlacement,
    ctx: &RenderContext<'_>,
) -> (SurfaceFrame, SurfaceReport) {
    let surface: SurfaceId = view.id().into();
    let mut frame = SurfaceFrame::new(surface, placement.bounds);
    let mut report = SurfaceReport::new(surface);
    let host = ctx.host;

    if view.core().parse_failed() {
        report.diagnostics.push(SurfaceDiagnostic::ParseFailure);
    }

    let visible: Vec<Candle> = view.core().visible_candles(ctx.window.as_ref()).to_vec();
    let base = view
        .core_mut()
        .frame_base(&visible, ctx.config.range_padding);
    let (top, height) = plot_span(placement.plot);
    let transform = base.map(|b| view.core().scale.transform(b, top, height));

    if visible.len() < 2 {
        debug!(%surface, candles = visible.len(), "window too small, data layer skipped");
        report.diagnostics.push(SurfaceDiagnostic::EmptyWindow {
            candles: visible.len(),
        });
    } else if let (Some(transform), Some(window)) = (transform.as_ref(), ctx.window.as_ref()) {
        let mut projected = Vec::with_capacity(visible.len());
        let mut skipped = 0usize;
        for candle in &visible {
            match view.core().align(host, window, candle.t) {
                Some(index) => projected.push(ProjectedCandle {
                    x: host.data_index_to_pixel(index as f64).as_f32(),
                    candle: *candle,
                }),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(%surface, skipped, "candles without a host bar");
            report
                .diagnostics
                .push(SurfaceDiagnostic::AlignmentMiss { skipped });
        }

        let painter = view.painter();
        let paint_ctx = PaintContext {
            plot: placement.plot,
            transform,
            spacing: host.viewport().candle_spacing,
        };
        frame.begin_layer(Layer::Series);
        frame.clipped(placement.plot, |f| painter.paint(&projected, &paint_ctx, f));
        report.drawn_candles = projected.len();
    }

    if let Some(transform) = transform.as_ref() {
        if placement.draw_axis {
            frame.begin_layer(Layer::Axis);
            paint_axis(
                &mut frame,
                placement.axis_strip,
                placement.axis_side,
                transform,
                ctx.theme,
                ctx.config.tick_spacing_px,
            );
        }

        if let Some(last) = visible.last() {
            frame.begin_layer(Layer::PriceTag);
            paint_price_tag(
                &mut frame,
                placement.axis_strip,
                placement.axis_side,
                last.c,
                transform,
                view.core().color,
                ctx.theme,
            );
        }

        if view.drawings().is_some() || view.pending_drawing().is_some() {
            let projection = Projection::new(host, view.core().candles(), *transform, placement.plot);
            frame.begin_layer(Layer::Drawings);
            let mut drawn = 0;
            frame.clipped(placement.plot, |f| {
                if let Some(store) = view.drawings() {
                    drawn = store.render(&projection, f);
                }
                if let Some(pending) = view.pending_drawing() {
                    DrawingStore::render_pending(pending, ctx.theme.preview_opacity, &projection, f);
                }
            });
            report.drawn_drawings = drawn;
        }

        if let Some(position) = view.crosshair() {
            frame.begin_layer(Layer::Crosshair);
            paint_crosshair(
                &mut frame,
                placement.plot,
                Some((placement.axis_strip, placement.axis_side)),
                position,
                transform,
                ctx.theme,
            );
        }
    }

    frame.begin_layer(Layer::Legend);
    let lines = legend_lines(view, &visible, ctx);
    let row_height = ctx.theme.legend_size + px(2.0);
    let mut legend_area = placement.plot;
    legend_area.origin.y += row_height * placement.legend_row as f32;
    paint_legend(&mut frame, legend_area, &lines, ctx.theme);

    (frame, report)
}

fn legend_lines<V: SurfaceView + ?Sized>(
    view: &V,
    visible: &[Candle],
    ctx: &RenderContext<'_>,
) -> Vec<(String, Hsla)> {
    let core = view.core();
    let title = if core.parse_failed() {
        format!("{} (no data)", core.source)
    } else {
        core.source.to_string()
    };
    let mut lines = vec![(title, core.color)];

    if let Some(c) = visible.last() {
        let step = if visible.len() >= 2 {
            (c.h - c.l).abs().max(c.c.abs() * 1e-5) / 100.0
        } else {
            c.c.abs() / 10_000.0
        };
        let when = format_timestamp_ms(c.t, format_for(ctx.host.timeframe()));
        lines.push((
            format!(
                "O {}  H {}  L {}  C {}  {}",
                format_price(c.o, step),
                format_price(c.h, step),
                format_price(c.l, step),
                format_price(c.c, step),
                when
            ),
            ctx.theme.legend_text,
        ));
    }
    lines
}

/// Dirty flag shared with the redraw hub observer.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    dirty: Arc<AtomicBool>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Starts dirty so the first frame always renders.
    pub fn new() -> Self {
        Self {
            dirty: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

pub struct RenderSynchronizer {
    scheduler: FrameScheduler,
    theme: ChartTheme,
    frames_rendered: u64,
    _subscription: Subscription,
}

impl RenderSynchronizer {
    /// Subscribes to the host's post-redraw hook for the synchronizer's lifetime.
    pub fn new(hub: &RedrawHub, theme: ChartTheme) -> Self {
        let scheduler = FrameScheduler::new();
        let observer = scheduler.clone();
        let subscription = hub.subscribe(move |_reason| observer.mark_dirty());
        Self {
            scheduler,
            theme,
            frames_rendered: 0,
            _subscription: subscription,
        }
    }

    pub fn on_host_redraw(&self) {
        self.scheduler.mark_dirty();
    }

    pub fn request_redraw(&self) {
        self.scheduler.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn theme(&self) -> &ChartTheme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: ChartTheme) {
        self.theme = theme;
        self.scheduler.mark_dirty();
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Renders only if something asked for a redraw since the last frame.
    pub fn take_frame(
        &mut self,
        host: &dyn HostChart,
        overlays: &mut OverlayManager,
        panes: &mut LinkedPaneManager,
        config: &EngineConfig,
    ) -> Option<Frame> {
        if !self.scheduler.take_dirty() {
            return None;
        }
        Some(self.render(host, overlays, panes, config))
    }

    /// Renders every visible overlay, then every visible pane.
    pub fn render(
        &mut self,
        host: &dyn HostChart,
        overlays: &mut OverlayManager,
        panes: &mut LinkedPaneManager,
        config: &EngineConfig,
    ) -> Frame {
        let ctx = RenderContext::new(host, config, &self.theme);
        let mut frame = Frame::default();
        for (surface, report) in overlays
            .render(&ctx)
            .into_iter()
            .chain(panes.render(&ctx))
        {
            frame.surfaces.push(surface);
            frame.report.surfaces.push(report);
        }
        self.frames_rendered += 1;
        debug!(
            surfaces = frame.surfaces.len(),
            window = ?ctx.window,
            "overlay frame rendered"
        );
        frame
    }
}
