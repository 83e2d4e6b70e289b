use super::color::hex_color;
use crate::error::OverlayError;
use gpui::Hsla;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(pub u64);

/// Position in data space: fractional index into the surface's candle series
/// and a price in the surface's own scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub index: f64,
    pub price: f64,
}

impl DataPoint {
    pub fn new(index: f64, price: f64) -> Self {
        Self { index, price }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingTool {
    Horizontal,
    Vertical,
    Trendline,
    Rectangle,
}

impl DrawingTool {
    /// One-shot tools commit on pointer-down, the others on pointer-up.
    pub fn is_one_shot(self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical)
    }
}

impl FromStr for DrawingTool {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "hline" => Ok(Self::Horizontal),
            "vertical" | "vline" => Ok(Self::Vertical),
            "trendline" | "line" => Ok(Self::Trendline),
            "rectangle" | "rect" => Ok(Self::Rectangle),
            other => Err(OverlayError::InvalidSettings(format!(
                "unknown drawing tool `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawingShape {
    Horizontal {
        price: f64,
    },
    Vertical {
        data_index: f64,
    },
    Trendline {
        start_index: f64,
        start_price: f64,
        end_index: f64,
        end_price: f64,
    },
    Rectangle {
        start_index: f64,
        start_price: f64,
        end_index: f64,
        end_price: f64,
    },
}

impl DrawingShape {
    /// Builds the shape a tool produces for a gesture from `start` to `end`.
    /// One-shot tools only look at `start`.
    pub fn from_tool(tool: DrawingTool, start: DataPoint, end: DataPoint) -> Self {
        match tool {
            DrawingTool::Horizontal => Self::Horizontal { price: start.price },
            DrawingTool::Vertical => Self::Vertical {
                data_index: start.index,
            },
            DrawingTool::Trendline => Self::Trendline {
                start_index: start.index,
                start_price: start.price,
                end_index: end.index,
                end_price: end.price,
            },
            DrawingTool::Rectangle => Self::Rectangle {
                start_index: start.index,
                start_price: start.price,
                end_index: end.index,
                end_price: end.price,
            },
        }
    }

    pub fn tool(&self) -> DrawingTool {
        match self {
            Self::Horizontal { .. } => DrawingTool::Horizontal,
            Self::Vertical { .. } => DrawingTool::Vertical,
            Self::Trendline { .. } => DrawingTool::Trendline,
            Self::Rectangle { .. } => DrawingTool::Rectangle,
        }
    }
}

/// A committed annotation. Edits are remove + add, never in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub shape: DrawingShape,
    #[serde(with = "hex_color")]
    pub color: Hsla,
}

/// Preview of a two-point drawing while the pointer is still down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingDrawing {
    pub tool: DrawingTool,
    pub start: DataPoint,
    pub current: DataPoint,
    pub color: Hsla,
}

impl PendingDrawing {
    pub fn shape(&self) -> DrawingShape {
        DrawingShape::from_tool(self.tool, self.start, self.current)
    }
}

/// Tool selection handed to the gesture classifier at pointer-down by
/// whatever UI owns the toolbar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingContext {
    pub tool: Option<DrawingTool>,
    pub color: Hsla,
}

impl DrawingContext {
    pub fn none() -> Self {
        Self {
            tool: None,
            color: gpui::white(),
        }
    }

    pub fn with_tool(tool: DrawingTool, color: Hsla) -> Self {
        Self {
            tool: Some(tool),
            color,
        }
    }
}

impl Default for DrawingContext {
    fn default() -> Self {
        Self::none()
    }
}
