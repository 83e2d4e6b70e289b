//! Single entry point a host chart embeds: both managers, the synchronizer
//! and the shared pointer capture behind one value.

use crate::config::EngineConfig;
use crate::data_types::{DrawingContext, DrawingTool, EngineSnapshot, Timeframe};
use crate::error::OverlayError;
use crate::gesture::{GestureResponse, PointerEvent};
use crate::host::{HostChart, PointerCapture, RedrawHub};
use crate::linked_pane::LinkedPaneManager;
use crate::overlay::OverlayManager;
use crate::rendering::Frame;
use crate::sync::RenderSynchronizer;
use crate::theme::ChartTheme;
use gpui::{Hsla, Pixels, Point};
use tracing::{info, warn};

pub struct ChartOverlays {
    config: EngineConfig,
    overlays: OverlayManager,
    panes: LinkedPaneManager,
    sync: RenderSynchronizer,
    capture: PointerCapture,
    drawing: DrawingContext,
}

impl ChartOverlays {
    pub fn new(config: EngineConfig, hub: &RedrawHub) -> eyre::Result<Self> {
        Self::with_theme(config, hub, ChartTheme::default())
    }

    pub fn with_theme(config: EngineConfig, hub: &RedrawHub, theme: ChartTheme) -> eyre::Result<Self> {
        config.validate()?;
        Ok(Self {
            overlays: OverlayManager::new(config.clone())?,
            panes: LinkedPaneManager::new(config.clone())?,
            sync: RenderSynchronizer::new(hub, theme),
            capture: PointerCapture::new(),
            drawing: DrawingContext::none(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayManager {
        self.sync.request_redraw();
        &mut self.overlays
    }

    pub fn panes(&self) -> &LinkedPaneManager {
        &self.panes
    }

    pub fn panes_mut(&mut self) -> &mut LinkedPaneManager {
        self.sync.request_redraw();
        &mut self.panes
    }

    pub fn synchronizer(&self) -> &RenderSynchronizer {
        &self.sync
    }

    pub fn capture(&self) -> &PointerCapture {
        &self.capture
    }

    /// Tool applied to the next press inside a pane, `None` for navigation.
    pub fn set_drawing_tool(&mut self, tool: Option<DrawingTool>, color: Hsla) {
        self.drawing = match tool {
            Some(tool) => DrawingContext::with_tool(tool, color),
            None => DrawingContext::none(),
        };
    }

    pub fn drawing_tool(&self) -> Option<DrawingTool> {
        self.drawing.tool
    }

    pub fn set_theme(&mut self, theme: ChartTheme) {
        self.sync.set_theme(theme);
    }

    /// Re-resamples every surface for the host's new timeframe.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        let changed = self.overlays.set_timeframe(timeframe) + self.panes.set_timeframe(timeframe);
        if changed > 0 {
            self.sync.request_redraw();
        }
    }

    pub fn on_host_redraw(&self) {
        self.sync.on_host_redraw();
    }

    pub fn request_redraw(&self) {
        self.sync.request_redraw();
    }

    pub fn needs_redraw(&self) -> bool {
        self.sync.is_dirty()
    }

    /// Frame for this tick, if anything changed since the last one.
    pub fn take_frame(&mut self, host: &dyn HostChart) -> Option<Frame> {
        self.sync
            .take_frame(host, &mut self.overlays, &mut self.panes, &self.config)
    }

    pub fn frame(&mut self, host: &dyn HostChart) -> Frame {
        self.sync
            .render(host, &mut self.overlays, &mut self.panes, &self.config)
    }

    /// Panes take presses inside their own bounds; everything else is
    /// offered to the overlays.
    pub fn pointer_down(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        let response = if self.panes.pane_at(host, event.position).is_some() {
            self.panes
                .pointer_down(event, host, self.drawing, &self.capture)
        } else {
            self.overlays.pointer_down(event, host, &self.capture)
        };
        if response.handled {
            self.sync.request_redraw();
        }
        response
    }

    /// Feeds the active gesture, or tracks hover for the pane crosshairs.
    pub fn pointer_move(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        let response = if self.panes.has_active_gesture() {
            self.panes.pointer_move(event, host)
        } else if self.overlays.has_active_gesture() {
            self.overlays.pointer_move(event, host)
        } else {
            if self.panes.hover(host, Some(event.position)) {
                self.sync.request_redraw();
            }
            return GestureResponse::ignored();
        };
        if response.handled {
            self.sync.request_redraw();
        }
        response
    }

    pub fn pointer_up(&mut self, event: PointerEvent, host: &mut dyn HostChart) -> GestureResponse {
        let response = if self.panes.has_active_gesture() {
            self.panes.pointer_up(event, host)
        } else if self.overlays.has_active_gesture() {
            self.overlays.pointer_up(event, host)
        } else {
            GestureResponse::ignored()
        };
        if response.handled {
            self.sync.request_redraw();
        }
        response
    }

    /// Pointer left the chart area.
    pub fn pointer_leave(&mut self, host: &dyn HostChart) {
        if self.panes.hover(host, None::<Point<Pixels>>) {
            self.sync.request_redraw();
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            overlays: self.overlays.snapshots(),
            panes: self.panes.snapshots(),
        }
    }

    /// Applies persisted state to the surfaces that are already registered.
    /// Entries without a matching source are skipped and returned.
    pub fn restore(&mut self, snapshot: &EngineSnapshot) -> Vec<OverlayError> {
        let mut skipped = Vec::new();
        for overlay in &snapshot.overlays {
            if let Err(err) = self.overlays.restore(overlay) {
                warn!(error = %err, "overlay snapshot skipped");
                skipped.push(err);
            }
        }
        for pane in &snapshot.panes {
            if let Err(err) = self.panes.restore(pane) {
                warn!(error = %err, "pane snapshot skipped");
                skipped.push(err);
            }
        }
        info!(
            overlays = snapshot.overlays.len(),
            panes = snapshot.panes.len(),
            skipped = skipped.len(),
            "state restored"
        );
        self.sync.request_redraw();
        skipped
    }
}
