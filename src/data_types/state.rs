use super::color::hex_color;
use super::{CandleStyle, Drawing, OverlayDisplay, OverlayId, PaneDisplay, PaneId, SourceRef};
use gpui::Hsla;
use serde::{Deserialize, Serialize};

/// Persistable state of one overlay. The engine never writes this anywhere
/// itself, an external store does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    pub id: OverlayId,
    pub source: SourceRef,
    #[serde(with = "hex_color")]
    pub color: Hsla,
    pub visible: bool,
    pub display: OverlayDisplay,
    pub line_width: f32,
    pub candle_style: CandleStyle,
    pub price_zoom: f64,
    pub price_offset: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    pub id: PaneId,
    pub source: SourceRef,
    #[serde(with = "hex_color")]
    pub color: Hsla,
    pub visible: bool,
    pub display: PaneDisplay,
    pub line_width: f32,
    pub area_opacity: f32,
    pub candle_style: CandleStyle,
    pub height: f32,
    pub auto_scale: bool,
    pub price_zoom: f64,
    pub price_offset: f64,
    pub drawings: Vec<Drawing>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub overlays: Vec<OverlaySnapshot>,
    pub panes: Vec<PaneSnapshot>,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> eyre::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Partial update coming from the overlay settings popup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    #[serde(with = "hex_color::option")]
    pub color: Option<Hsla>,
    pub visible: Option<bool>,
    pub display: Option<OverlayDisplay>,
    pub line_width: Option<f32>,
    pub candle_style: Option<CandleStyle>,
}

/// Partial update coming from the pane settings popup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneSettings {
    #[serde(with = "hex_color::option")]
    pub color: Option<Hsla>,
    pub visible: Option<bool>,
    pub display: Option<PaneDisplay>,
    pub line_width: Option<f32>,
    pub area_opacity: Option<f32>,
    pub candle_style: Option<CandleStyle>,
    pub height: Option<f32>,
    pub auto_scale: Option<bool>,
}
