//! The label cache: placement requests collected while layers are drawn,
//! resolved in one collision pass once every layer has been visited.
//!
//! Placement walks the cache from the newest entry to the oldest, so labels
//! from layers drawn later get first pick of the map. Each entry tries its
//! candidates in a fixed order and keeps the first one that passes, in turn:
//! the in-image test (only when partials are disallowed), the test against
//! other labels' markers, duplicate suppression and the overlap test against
//! labels already placed. Rendering then walks the cache oldest first.

use crate::error::{CacheState, Error, Result};
use crate::geometry::Point;
use crate::geometry::predicates::{distance_point_to_point, intersect_label_polygons, label_in_image};
use crate::text_metrics::LabelMetrics;

use super::candidates::{Candidate, Candidates};
use super::metrics::{get_metrics, marker_offset, marker_rect, marker_size};
use super::style::{LabelStyle, LayerType, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStatus {
    #[default]
    Pending,
    Drawn,
    Rejected,
}

/// Why a candidate (or a whole entry) was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Empty text or an unusable anchor.
    Degenerate,
    /// Label wider than the feature it annotates.
    FeatureSize,
    OutOfImage,
    Marker,
    Duplicate,
    Overlap,
}

/// Observer for the placement pass. Every method defaults to a no-op.
pub trait PlacementTrace {
    fn visit(&mut self, _index: usize) {}
    fn candidate(&mut self, _index: usize, _candidate: &Candidate) {}
    fn rejected(&mut self, _index: usize, _reason: Rejection) {}
    fn settled(&mut self, _index: usize, _status: LabelStatus) {}
}

impl PlacementTrace for () {}

/// Everything the layer pass knows about a label when it asks for one.
/// Styles are owned copies taken at request time.
#[derive(Debug, Clone)]
pub struct LabelRequest {
    pub text: String,
    /// Size of the labelled feature in pixels; negative when unknown.
    pub feature_size: f64,
    pub point: Point,
    pub label: LabelStyle,
    /// Marker styles, only kept for point and annotation layers.
    pub styles: Vec<Style>,
    pub layer_type: LayerType,
    pub layer_index: usize,
    pub class_index: usize,
    pub tile_index: Option<usize>,
    pub shape_index: Option<usize>,
}

impl LabelRequest {
    pub fn new(text: impl Into<String>, point: Point, label: LabelStyle) -> Self {
        Self {
            text: text.into(),
            feature_size: -1.0,
            point,
            label,
            styles: Vec::new(),
            layer_type: LayerType::Annotation,
            layer_index: 0,
            class_index: 0,
            tile_index: None,
            shape_index: None,
        }
    }

    pub fn layer(mut self, layer_type: LayerType, layer_index: usize) -> Self {
        self.layer_type = layer_type;
        self.layer_index = layer_index;
        self
    }

    pub fn class(mut self, class_index: usize) -> Self {
        self.class_index = class_index;
        self
    }

    pub fn feature_size(mut self, feature_size: f64) -> Self {
        self.feature_size = feature_size;
        self
    }

    pub fn markers(mut self, styles: Vec<Style>) -> Self {
        self.styles = styles;
        self
    }

    pub fn shape(mut self, tile_index: Option<usize>, shape_index: Option<usize>) -> Self {
        self.tile_index = tile_index;
        self.shape_index = shape_index;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LabelCacheEntry {
    pub text: String,
    pub feature_size: f64,
    /// Anchor in device coordinates.
    pub point: Point,
    pub label: LabelStyle,
    pub styles: Vec<Style>,
    pub layer_type: LayerType,
    pub layer_index: usize,
    pub class_index: usize,
    pub tile_index: Option<usize>,
    pub shape_index: Option<usize>,
    /// Start of the first text baseline once placed.
    pub label_point: Point,
    /// Polygon of the last candidate tried; final once the entry is drawn.
    pub poly: Vec<Point>,
    pub status: LabelStatus,
    /// Markers are painted by the cache draw loop (annotation layers only).
    pub draw_marker: bool,
}

impl LabelCacheEntry {
    fn from_request(request: LabelRequest) -> Self {
        let draw_marker =
            request.layer_type == LayerType::Annotation && !request.styles.is_empty();
        Self {
            text: request.text,
            feature_size: request.feature_size,
            point: request.point,
            label_point: request.point,
            label: request.label,
            styles: request.styles,
            layer_type: request.layer_type,
            layer_index: request.layer_index,
            class_index: request.class_index,
            tile_index: request.tile_index,
            shape_index: request.shape_index,
            poly: Vec::new(),
            status: LabelStatus::Pending,
            draw_marker,
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.status == LabelStatus::Drawn
    }
}

/// Collision footprint of a label's marker.
#[derive(Debug, Clone)]
pub struct MarkerCacheEntry {
    /// Index of the owning label.
    pub id: usize,
    pub poly: Vec<Point>,
    /// Set once the owning label's search has started; only registered
    /// markers block other labels.
    pub registered: bool,
}

#[derive(Debug, Clone)]
pub struct LabelCache {
    labels: Vec<LabelCacheEntry>,
    markers: Vec<MarkerCacheEntry>,
    state: CacheState,
}

impl Default for LabelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelCache {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(labels: usize, markers: usize) -> Self {
        Self {
            labels: Vec::with_capacity(labels),
            markers: Vec::with_capacity(markers),
            state: CacheState::Open,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn labels(&self) -> &[LabelCacheEntry] {
        &self.labels
    }

    pub fn markers(&self) -> &[MarkerCacheEntry] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Drop every entry and reopen the cache for a new draw. Capacity is kept.
    pub fn reset(&mut self) {
        self.labels.clear();
        self.markers.clear();
        self.state = CacheState::Open;
    }

    fn require(&self, state: CacheState, operation: &'static str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::CacheState {
                state: self.state,
                operation,
            })
        }
    }

    pub(crate) fn require_processed(&self) -> Result<()> {
        self.require(CacheState::Processed, "draw")
    }

    /// Queue a label. Returns its cache index.
    ///
    /// Space is reserved before anything is pushed, so an allocation failure
    /// leaves both lists untouched.
    pub fn append(&mut self, request: LabelRequest) -> Result<usize> {
        self.require(CacheState::Open, "append")?;

        let size = if request.layer_type.has_markers() {
            marker_size(&request.styles)
        } else {
            0.0
        };
        self.labels.try_reserve(1)?;
        if size > 0.0 {
            self.markers.try_reserve(1)?;
        }

        let index = self.labels.len();
        if size > 0.0 {
            self.markers.push(MarkerCacheEntry {
                id: index,
                poly: marker_rect(&request.point, size).to_polygon(),
                registered: false,
            });
        }
        self.labels.push(LabelCacheEntry::from_request(request));
        Ok(index)
    }

    /// Place every queued label against a `width` x `height` image.
    pub fn process<M>(&mut self, metrics: &M, width: f64, height: f64) -> Result<()>
    where
        M: LabelMetrics + ?Sized,
    {
        self.process_traced(metrics, width, height, &mut ())
    }

    /// [`process`](Self::process) with an observer for each decision.
    ///
    /// A metrics failure aborts the whole pass and leaves the cache `Failed`.
    pub fn process_traced<M, T>(
        &mut self,
        metrics: &M,
        width: f64,
        height: f64,
        trace: &mut T,
    ) -> Result<()>
    where
        M: LabelMetrics + ?Sized,
        T: PlacementTrace + ?Sized,
    {
        self.require(CacheState::Open, "process")?;

        let mut drawn = 0usize;
        for l in (0..self.labels.len()).rev() {
            trace.visit(l);
            let status = match self.place(l, metrics, width, height, trace) {
                Ok(status) => status,
                Err(err) => {
                    log::debug!("placement aborted at label {l}: {err}");
                    self.state = CacheState::Failed;
                    return Err(err);
                }
            };
            self.labels[l].status = status;
            trace.settled(l, status);
            if status == LabelStatus::Drawn {
                drawn += 1;
            }
        }

        self.state = CacheState::Processed;
        log::debug!(
            "label cache processed: {drawn} of {} labels placed",
            self.labels.len()
        );
        Ok(())
    }

    fn place<M, T>(
        &mut self,
        l: usize,
        metrics: &M,
        width: f64,
        height: f64,
        trace: &mut T,
    ) -> Result<LabelStatus>
    where
        M: LabelMetrics + ?Sized,
        T: PlacementTrace + ?Sized,
    {
        let entry = &self.labels[l];
        if entry.text.is_empty() || !entry.point.is_finite() {
            trace.rejected(l, Rejection::Degenerate);
            return Ok(LabelStatus::Rejected);
        }

        let rect = metrics.label_size(&entry.text, &entry.label)?;
        if entry.label.auto_min_feature_size
            && entry.feature_size >= 0.0
            && rect.width() > entry.feature_size
        {
            log::trace!("label {l} `{}` wider than its feature", entry.text);
            trace.rejected(l, Rejection::FeatureSize);
            return Ok(LabelStatus::Rejected);
        }

        let marker_push = if entry.layer_type.has_markers() {
            marker_offset(marker_size(&entry.styles))
        } else {
            0.0
        };
        self.register_markers(l);

        let entry = &self.labels[l];
        let label = &entry.label;
        let mut last = None;
        for candidate in Candidates::new(label.position, label.angle, entry.layer_type) {
            trace.candidate(l, &candidate);
            let offset = if candidate.position.is_centered_or_explicit() {
                label.offset
            } else {
                (label.offset.0 + marker_push, label.offset.1 + marker_push)
            };
            let placement = get_metrics(
                &entry.point,
                candidate.position,
                &rect,
                offset,
                candidate.angle,
                label.buffer,
            );

            match self.test_candidate(l, &placement.poly, width, height) {
                None => {
                    self.accept(l, candidate, placement.origin, placement.poly);
                    return Ok(LabelStatus::Drawn);
                }
                Some(reason) => {
                    log::trace!(
                        "label {l} `{}` at {:?}: {reason:?}",
                        entry.text,
                        candidate.position
                    );
                    trace.rejected(l, reason);
                    last = Some((candidate, placement));
                }
            }
        }

        let force = label.force;
        match last {
            Some((candidate, placement)) if force => {
                log::trace!("label {l} forced at {:?}", candidate.position);
                self.accept(l, candidate, placement.origin, placement.poly);
                Ok(LabelStatus::Drawn)
            }
            Some((_, placement)) => {
                self.labels[l].poly = placement.poly;
                Ok(LabelStatus::Rejected)
            }
            None => Ok(LabelStatus::Rejected),
        }
    }

    fn register_markers(&mut self, l: usize) {
        for marker in self.markers.iter_mut().filter(|m| m.id == l) {
            marker.registered = true;
        }
    }

    fn accept(&mut self, l: usize, candidate: Candidate, origin: Point, poly: Vec<Point>) {
        let entry = &mut self.labels[l];
        entry.label.position = candidate.position;
        entry.label.angle = candidate.angle;
        entry.label_point = origin;
        entry.poly = poly;
    }

    fn test_candidate(&self, l: usize, poly: &[Point], width: f64, height: f64) -> Option<Rejection> {
        let entry = &self.labels[l];
        let label = &entry.label;

        if !label.partials && !label_in_image(width, height, poly, label.buffer) {
            return Some(Rejection::OutOfImage);
        }

        // a label may overlap its own marker
        if self
            .markers
            .iter()
            .any(|m| m.registered && m.id != l && intersect_label_polygons(&m.poly, poly))
        {
            return Some(Rejection::Marker);
        }

        let placed = || self.labels[l + 1..].iter().filter(|other| other.is_drawn());

        if let Some(min_distance) = label.min_distance
            && placed().any(|other| {
                other.class_index == entry.class_index
                    && other.text == entry.text
                    && distance_point_to_point(&other.point, &entry.point) <= min_distance
            })
        {
            return Some(Rejection::Duplicate);
        }

        if placed().any(|other| intersect_label_polygons(&other.poly, poly)) {
            return Some(Rejection::Overlap);
        }

        None
    }

    /// Entries that survived placement, in paint order.
    pub fn drawn(&self) -> impl Iterator<Item = (usize, &LabelCacheEntry)> {
        self.labels.iter().enumerate().filter(|(_, e)| e.is_drawn())
    }
}
