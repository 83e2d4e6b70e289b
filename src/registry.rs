//! State shared by overlays and panes, and the collection that owns them.

use crate::alignment::{align_time, HostAxis};
use crate::data_types::{Candle, SourceRef, SurfaceId, Timeframe};
use crate::error::{OverlayError, Result};
use crate::gesture::{GestureClassifier, GestureConfig, GestureEffect, GesturePhase};
use crate::host::{HostChart, VisibleWindow};
use crate::resample::SeriesCache;
use crate::transform::{AxisTransform, PriceRange, ScaleState};
use gpui::{Bounds, Hsla, Pixels};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-surface state common to overlays and panes.
#[derive(Debug)]
pub struct SurfaceCore {
    pub source: SourceRef,
    pub color: Hsla,
    pub visible: bool,
    pub scale: ScaleState,
    series: SeriesCache,
    /// Base range of the last frame that had data, used when the window empties.
    last_base: Option<PriceRange>,
    gesture: GestureClassifier,
    parse_failed: bool,
}

impl SurfaceCore {
    pub fn new(
        source: SourceRef,
        color: Hsla,
        raw: Vec<Candle>,
        timeframe: Timeframe,
        gesture: GestureConfig,
    ) -> Self {
        let series = SeriesCache::new(raw, timeframe);
        let parse_failed = series.is_empty();
        Self {
            source,
            color,
            visible: true,
            scale: ScaleState::default(),
            series,
            last_base: None,
            gesture: GestureClassifier::new(gesture),
            parse_failed,
        }
    }

    pub fn series(&self) -> &SeriesCache {
        &self.series
    }

    pub fn candles(&self) -> &[Candle] {
        self.series.candles()
    }

    /// Source delivered no usable rows.
    pub fn parse_failed(&self) -> bool {
        self.parse_failed
    }

    pub fn ensure_timeframe(&mut self, timeframe: Timeframe) -> bool {
        let changed = self.series.ensure(timeframe);
        if changed {
            self.last_base = None;
            if self.scale.is_manual() {
                // The frozen range belongs to the old bars.
                let (zoom, offset) = (self.scale.zoom, self.scale.offset);
                self.scale.restore(zoom, offset, false);
            }
        }
        changed
    }

    pub fn gesture(&self) -> &GestureClassifier {
        &self.gesture
    }

    pub fn gesture_mut(&mut self) -> &mut GestureClassifier {
        &mut self.gesture
    }

    /// Classifier and series borrowed together, for gestures that project
    /// through the series while they advance.
    pub fn gesture_and_candles(&mut self) -> (&mut GestureClassifier, &[Candle]) {
        (&mut self.gesture, self.series.candles())
    }

    pub fn phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    pub fn last_base(&self) -> Option<PriceRange> {
        self.last_base
    }

    /// Candles of the resampled series inside the host window.
    pub fn visible_candles(&self, window: Option<&VisibleWindow>) -> &[Candle] {
        let candles = self.candles();
        let Some(window) = window else {
            return &[];
        };
        let start = candles.partition_point(|c| c.t < window.start_time);
        let end = candles.partition_point(|c| c.t <= window.end_time);
        &candles[start..end.max(start)]
    }

    /// Base range for a frame. Updates the remembered range.
    pub fn frame_base(&mut self, visible: &[Candle], padding: f64) -> Option<PriceRange> {
        let fitted = if visible.len() >= 2 {
            PriceRange::from_candles(visible, padding)
        } else {
            None
        };
        let base = self.scale.base_range(fitted).or(self.last_base);
        if base.is_some() {
            self.last_base = base;
        }
        base
    }

    /// Transform as the user currently sees it, without touching frame state.
    pub fn current_transform(
        &self,
        host: &dyn HostChart,
        plot: Bounds<Pixels>,
        padding: f64,
    ) -> Option<AxisTransform> {
        let window = VisibleWindow::from_host(host);
        let visible = self.visible_candles(window.as_ref());
        let fitted = if visible.len() >= 2 {
            PriceRange::from_candles(visible, padding)
        } else {
            None
        };
        let base = if self.scale.auto_scale {
            fitted.or(self.last_base)
        } else {
            self.scale.anchor().or(fitted).or(self.last_base)
        }?;
        let (top, height) = plot_span(plot);
        Some(self.scale.transform(base, top, height))
    }

    /// Applies the scale and host effects of a gesture. Returns the effects
    /// the owning surface has to handle itself.
    pub fn apply_effects(
        &mut self,
        effects: Vec<GestureEffect>,
        host: &mut dyn HostChart,
    ) -> Vec<GestureEffect> {
        let mut rest = Vec::new();
        for effect in effects {
            match effect {
                GestureEffect::SetScale { zoom, offset, base } => {
                    self.scale.set_manual(zoom, offset, base);
                }
                GestureEffect::ResetScale => self.scale.reset(),
                GestureEffect::PanHost { dx } => host.pan_horizontal(dx),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Host bar index closest to `t` within the window, if close enough.
    pub fn align(&self, host: &dyn HostChart, window: &VisibleWindow, t: i64) -> Option<usize> {
        align_time(
            &HostAxis(host),
            window.start_index..=window.end_index,
            t,
            host.timeframe(),
        )
    }
}

pub fn plot_span(plot: Bounds<Pixels>) -> (f32, f32) {
    (f32::from(plot.origin.y), f32::from(plot.size.height))
}

/// Entities stored in a [`SurfaceRegistry`].
pub trait SurfaceEntity: Send {
    type Id: Copy + Eq + fmt::Display + Into<SurfaceId>;

    fn id(&self) -> Self::Id;
    fn core(&self) -> &SurfaceCore;
    fn core_mut(&mut self) -> &mut SurfaceCore;
}

/// Reservation for a source whose history is still being fetched. Dropping
/// it without completing releases the source.
#[must_use]
pub struct PendingAdd {
    source: SourceRef,
    in_flight: Arc<Mutex<HashSet<SourceRef>>>,
}

impl PendingAdd {
    pub fn source(&self) -> &SourceRef {
        &self.source
    }
}

impl Drop for PendingAdd {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.source);
    }
}

impl fmt::Debug for PendingAdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAdd")
            .field("source", &self.source)
            .finish()
    }
}

/// Insertion-ordered collection of overlays or panes.
pub struct SurfaceRegistry<E> {
    entities: Vec<E>,
    in_flight: Arc<Mutex<HashSet<SourceRef>>>,
    palette: Vec<Hsla>,
    next_id: u64,
    inserted: usize,
}

impl<E: SurfaceEntity> SurfaceRegistry<E> {
    pub fn new(palette: Vec<Hsla>) -> Self {
        Self {
            entities: Vec::new(),
            in_flight: Arc::default(),
            palette,
            next_id: 1,
            inserted: 0,
        }
    }

    pub fn contains_source(&self, source: &SourceRef) -> bool {
        self.entities.iter().any(|e| &e.core().source == source)
    }

    pub fn is_in_flight(&self, source: &SourceRef) -> bool {
        self.in_flight.lock().contains(source)
    }

    pub fn begin_add(&self, source: SourceRef) -> Result<PendingAdd> {
        if self.contains_source(&source) {
            return Err(OverlayError::Duplicate(source));
        }
        if !self.in_flight.lock().insert(source.clone()) {
            return Err(OverlayError::Duplicate(source));
        }
        debug!(%source, "fetch started");
        Ok(PendingAdd {
            source,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Hands out the id and colour for a completed add.
    pub fn allocate(&mut self) -> (u64, Hsla) {
        let id = self.next_id;
        self.next_id += 1;
        let color = self.next_color();
        self.inserted += 1;
        (id, color)
    }

    /// First palette colour no live surface uses, cycling by insertion count
    /// once all of them are taken.
    pub fn next_color(&self) -> Hsla {
        let Some(fallback) = self.palette.get(self.inserted % self.palette.len().max(1)) else {
            return gpui::white();
        };
        self.palette
            .iter()
            .copied()
            .find(|c| self.entities.iter().all(|e| e.core().color != *c))
            .unwrap_or(*fallback)
    }

    pub fn insert(&mut self, entity: E) {
        info!(id = %entity.id(), source = %entity.core().source, "surface added");
        self.entities.push(entity);
    }

    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        let mut entity = self.entities.remove(index);
        // Ends any drag and releases its pointer capture.
        entity.core_mut().gesture_mut().cancel();
        info!(%id, "surface removed");
        Some(entity)
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: E::Id) -> Option<&mut E> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn require_mut(&mut self, id: E::Id) -> Result<&mut E> {
        self.get_mut(id)
            .ok_or_else(|| OverlayError::UnknownSurface(id.to_string()))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &E> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Re-resamples every surface from its raw history. Returns how many
    /// actually changed.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> usize {
        let changed: usize = self
            .entities
            .par_iter_mut()
            .map(|e| usize::from(e.core_mut().ensure_timeframe(timeframe)))
            .sum();
        info!(%timeframe, changed, "timeframe applied");
        changed
    }
}
