//! # Synaptome Core
//!
//! Parallel simulation engine for a 3-D tissue of cells that communicate
//! through synapses.
//!
//! Cells sit on an `X × Y` grid of columns; inside each column they are
//! stacked along a columnar axis, grouped by kind. Every tissue cell owns a
//! territory of synapse slots split into seven territorial lists, one per
//! territorial state. A round of the [`TransitionEngine`] runs six phases:
//!
//! - synapses to muscles, synapses in tissue
//! - territorial list redistribution
//! - synaptic migration between neighbouring cells
//! - signalling, cells
//!
//! The behaviour of cells and synapses is injected through the
//! [`TransitionFunctions`] trait; the engine only guarantees ordering,
//! determinism and that every unit is updated exactly once per phase.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use synaptome_core::{
//!     compute_out_degrees, fill_delimiters, seed_tissue, DynamicState, FillPolicy, StaticConfig,
//!     TissueConfig,
//! };
//! use synaptome_data::TerritorialState;
//!
//! let config = Arc::new(StaticConfig::new(TissueConfig::default()).unwrap());
//! let mut state = DynamicState::new(config);
//! seed_tissue(&mut state, 42);
//!
//! let histogram =
//!     compute_out_degrees(&mut state, 0, TerritorialState::SignalDelivery, 2, 2, 4).unwrap();
//! assert_eq!(histogram.total_cells(), 16 * 16 * 4);
//! fill_delimiters(&mut state, 0, FillPolicy::FromTerritorialStates);
//! ```

/// Out-degree histograms and territorial statistics
pub mod analyzer;
/// Bit-packed atomic buffers
pub mod bits;
/// Tissue configuration and derived layout
pub mod config;
/// Stride partitioning of work among workers
pub mod cursor;
/// The six-phase transition pipeline
pub mod engine;
/// Error types
pub mod error;
/// Delimiter regeneration policies
pub mod fill;
/// Performance metrics and logging setup
pub mod metrics;
/// Bounded shift windows
pub mod neighbourhood;
/// Fixed-size worker pool
pub mod pool;
/// Seeded random initialization
pub mod seeding;
/// Toroidal and clipped coordinate arithmetic
pub mod shift;
/// Mutable tissue state
pub mod tissue;

pub use analyzer::{compute_out_degrees, compute_out_degrees_with, territorial_statistics};
pub use config::{
    CellKindConfig, RecordBits, SensoryKindConfig, StaticConfig, TissueConfig, TorusConfig,
};
pub use engine::{
    CellContext, MuscleSynapseContext, Phase, SignallingContext, SynapseContext, SynapseUpdate,
    TransitionEngine, TransitionFunctions,
};
pub use error::{Result, TerritoryViolation, TissueError};
pub use fill::{fill_delimiters, regular_delimiters, FillPolicy};
pub use metrics::{init_logging, EngineMetrics};
pub use neighbourhood::SpatialNeighbourhood;
pub use pool::WorkerPool;
pub use seeding::seed_tissue;
pub use tissue::{DelimiterMode, DynamicState, SynapseView};
