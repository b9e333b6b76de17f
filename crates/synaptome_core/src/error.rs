//! Error types for synaptome_core.
//!
//! Only construction-time problems are recoverable errors. Precondition
//! violations inside a round (bad coordinates, shifts outside a
//! neighbourhood, corrupted tags) panic instead.

use synaptome_data::{TerritorialState, TissueCoordinates};
use thiserror::Error;

/// Main error type for building tissues and their worker pools.
#[derive(Error, Debug)]
pub enum TissueError {
    /// Grid extents are unusable
    #[error("Invalid extent: {0}")]
    Extent(String),

    /// A tissue or sensory cell kind is malformed
    #[error("Invalid cell kind {kind}: {reason}")]
    Kind { kind: usize, reason: String },

    /// A record bit-width is outside 1..=64
    #[error("Invalid bit width for {record} records: {bits} (expected 1..=64)")]
    BitWidth { record: &'static str, bits: u32 },

    /// A signalling radius does not fit its axis
    #[error("Invalid radius for kind {kind}: {reason}")]
    Radius { kind: usize, reason: String },

    /// Derived sizes overflow the addressable range
    #[error("Layout overflow: {0}")]
    Layout(String),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<TissueError>,
    },
}

/// Result type alias for synaptome_core operations.
pub type Result<T> = std::result::Result<T, TissueError>;

impl TissueError {
    #[must_use]
    pub fn extent<S: Into<String>>(msg: S) -> Self {
        Self::Extent(msg.into())
    }

    #[must_use]
    pub fn kind<S: Into<String>>(kind: usize, reason: S) -> Self {
        Self::Kind {
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn radius<S: Into<String>>(kind: usize, reason: S) -> Self {
        Self::Radius {
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn layout<S: Into<String>>(msg: S) -> Self {
        Self::Layout(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// A synapse whose tag disagrees with the list its delimiters place it in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("slot {slot} of cell {coords} is tagged {found} but its delimiters place it in {expected}")]
pub struct TerritoryViolation {
    pub coords: TissueCoordinates,
    pub slot: u32,
    pub expected: TerritorialState,
    pub found: TerritorialState,
}
