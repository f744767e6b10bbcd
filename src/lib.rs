#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod label;
pub mod render;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{MapDefinition, load_map, parse_map};
pub use draw::{DrawSummary, draw_map};
pub use error::{CacheState, Error, Result};
pub use label::{LabelCache, LabelRequest, LabelStatus};
pub use text_metrics::{FontSet, FontSource, LabelMetrics};
