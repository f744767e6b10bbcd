use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Lifecycle of a [`LabelCache`](crate::label::LabelCache) within one map draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Accepting label requests.
    Open,
    /// Placement finished; entries carry their final status.
    Processed,
    /// Placement was aborted by an error; the cache must be reset.
    Failed,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Open => f.write_str("open"),
            CacheState::Processed => f.write_str("processed"),
            CacheState::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown font alias `{0}`")]
    UnknownFont(String),

    #[error("unable to load font `{alias}`: {reason}")]
    FontLoad { alias: String, reason: String },

    #[error("label cache allocation failed: {0}")]
    Resource(#[from] TryReserveError),

    #[error("label cache is {state}, cannot {operation}")]
    CacheState {
        state: CacheState,
        operation: &'static str,
    },

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("{backend} backend failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("invalid map document: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
