pub mod cache;
pub mod candidates;
pub mod metrics;
pub mod style;

pub use cache::{
    LabelCache, LabelCacheEntry, LabelRequest, LabelStatus, MarkerCacheEntry, PlacementTrace,
    Rejection,
};
pub use candidates::{Candidate, Candidates, LINE_VERT_THRESHOLD};
pub use metrics::{MARKER_SLOP, Placement, get_metrics};
pub use style::{BitmapSize, Color, LabelFont, LabelStyle, LayerType, Position, Style, Symbol};
