pub mod candle;
pub mod color;
pub mod drawing;
pub mod state;
pub mod styles;

pub use candle::*;
pub use color::hex_color;
pub use drawing::*;
pub use state::*;
pub use styles::*;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(pub u64);

/// Any auxiliary surface the engine owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Overlay(OverlayId),
    Pane(PaneId),
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlay(id) => id.fmt(f),
            Self::Pane(id) => id.fmt(f),
        }
    }
}

impl From<OverlayId> for SurfaceId {
    fn from(id: OverlayId) -> Self {
        Self::Overlay(id)
    }
}

impl From<PaneId> for SurfaceId {
    fn from(id: PaneId) -> Self {
        Self::Pane(id)
    }
}
