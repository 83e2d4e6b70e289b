//! Symbol overlays and linked panes for GPUI candlestick charts.
//!
//! The host chart stays in charge of its own candles and input. This crate
//! keeps auxiliary surfaces (overlays drawn over the host plot, panes stacked
//! below it) aligned with the host time axis, gives each of them its own price
//! scale and renders them into a display list that `gpui_paint` replays.

pub mod alignment;
pub mod config;
pub mod data_types;
pub mod drawing_store;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod gpui_paint;
pub mod host;
pub mod ingest;
pub mod linked_pane;
pub mod overlay;
pub mod plot_types;
pub mod registry;
pub mod rendering;
pub mod resample;
pub mod sync;
pub mod theme;
pub mod transform;
pub mod utils;
pub mod view_controller;

pub use config::EngineConfig;
pub use data_types::{
    Candle, DataPoint, Drawing, DrawingContext, DrawingId, DrawingShape, DrawingTool, OverlayId,
    PaneId, SourceRef, SurfaceId, Timeframe,
};
pub use engine::ChartOverlays;
pub use error::OverlayError;
pub use host::{HostChart, HostViewport, Margins, RedrawHub, RedrawReason, VisibleWindow};
pub use linked_pane::{LinkedPane, LinkedPaneManager};
pub use overlay::{Overlay, OverlayManager};
pub use resample::resample;
pub use transform::{AxisTransform, PriceRange, ScaleState};
