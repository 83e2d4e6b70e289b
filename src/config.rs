use crate::data_types::color::parse_hex;
use crate::gesture::GestureConfig;
use eyre::{ensure, Result, WrapErr};
use gpui::Hsla;
use serde::{Deserialize, Serialize};

/// Tunables of the overlay engine. Every field has a default, so a partial
/// JSON document is enough to override a single value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pointer travel below which a press/release pair is a click.
    pub drag_threshold_px: f32,
    /// Zoom change per pixel of vertical axis drag.
    pub zoom_sensitivity: f64,
    pub min_price_zoom: f64,
    pub max_price_zoom: f64,
    /// Fraction of the visible price span added above and below the data.
    pub range_padding: f64,
    /// Approximate vertical distance between two price ticks.
    pub tick_spacing_px: f32,
    /// Height of a new pane as a fraction of the host chart height.
    pub default_pane_height: f32,
    pub min_pane_height: f32,
    /// How close to an overlay line a press must land to grab it.
    pub overlay_hit_tolerance_px: f32,
    /// Colours handed out to new surfaces, in insertion order.
    pub palette: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 3.0,
            zoom_sensitivity: 0.005,
            min_price_zoom: 0.5,
            max_price_zoom: 20.0,
            range_padding: 0.10,
            tick_spacing_px: 40.0,
            default_pane_height: 0.25,
            min_pane_height: 0.05,
            overlay_hit_tolerance_px: 6.0,
            palette: [
                "#f7931a", "#2962ff", "#e91e63", "#00bcd4", "#8bc34a", "#ff9800", "#9c27b0",
                "#607d8b",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).wrap_err("failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.drag_threshold_px >= 0.0,
            "drag_threshold_px must not be negative"
        );
        ensure!(
            self.zoom_sensitivity > 0.0,
            "zoom_sensitivity must be positive"
        );
        ensure!(
            self.min_price_zoom > 0.0 && self.min_price_zoom <= self.max_price_zoom,
            "price zoom bounds must satisfy 0 < min <= max"
        );
        ensure!(
            (0.0..1.0).contains(&self.range_padding),
            "range_padding must be in [0, 1)"
        );
        ensure!(self.tick_spacing_px > 0.0, "tick_spacing_px must be positive");
        ensure!(
            self.min_pane_height > 0.0 && self.min_pane_height <= self.default_pane_height,
            "pane heights must satisfy 0 < min <= default"
        );
        ensure!(!self.palette.is_empty(), "palette must not be empty");
        self.palette_colors()?;
        Ok(())
    }

    pub fn palette_colors(&self) -> Result<Vec<Hsla>> {
        self.palette
            .iter()
            .map(|hex| parse_hex(hex).wrap_err("invalid palette entry"))
            .collect()
    }

    pub fn gesture(&self) -> GestureConfig {
        GestureConfig {
            drag_threshold_px: self.drag_threshold_px,
            zoom_sensitivity: self.zoom_sensitivity,
            zoom_bounds: self.zoom_bounds(),
        }
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_price_zoom, self.max_price_zoom)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min_price_zoom;
        }
        zoom.clamp(self.min_price_zoom, self.max_price_zoom)
    }
}
