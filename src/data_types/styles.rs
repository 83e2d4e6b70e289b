use super::color::hex_color;
use gpui::Hsla;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayDisplay {
    #[default]
    Line,
    Candles,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneDisplay {
    #[default]
    Candles,
    Bars,
    Hollow,
    Line,
    Area,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleStyle {
    #[serde(with = "hex_color")]
    pub up_body_color: Hsla,
    #[serde(with = "hex_color")]
    pub down_body_color: Hsla,
    #[serde(with = "hex_color")]
    pub up_border_color: Hsla,
    #[serde(with = "hex_color")]
    pub down_border_color: Hsla,
    #[serde(with = "hex_color")]
    pub up_wick_color: Hsla,
    #[serde(with = "hex_color")]
    pub down_wick_color: Hsla,
    pub show_body: bool,
    pub show_border: bool,
    pub show_wick: bool,
    /// Body width relative to the host candle spacing (0.0 - 1.0)
    pub body_width_pct: f32,
}

impl Default for CandleStyle {
    fn default() -> Self {
        let green = gpui::green();
        let red = gpui::red();
        Self {
            up_body_color: green,
            down_body_color: red,
            up_border_color: green,
            down_border_color: red,
            up_wick_color: green,
            down_wick_color: red,
            show_body: true,
            show_border: true,
            show_wick: true,
            body_width_pct: 0.7,
        }
    }
}

impl CandleStyle {
    pub fn body(&self, up: bool) -> Hsla {
        if up {
            self.up_body_color
        } else {
            self.down_body_color
        }
    }

    pub fn border(&self, up: bool) -> Hsla {
        if up {
            self.up_border_color
        } else {
            self.down_border_color
        }
    }

    pub fn wick(&self, up: bool) -> Hsla {
        if up {
            self.up_wick_color
        } else {
            self.down_wick_color
        }
    }
}
