//! The six-phase transition pipeline.
//!
//! A round runs, strictly in order:
//!
//! 1. synapses to muscles
//! 2. synapses in tissue (records and territorial states)
//! 3. territorial list redistribution
//! 4. synaptic migration
//! 5. signalling
//! 6. cells
//!
//! Every phase splits its space among the workers of a fixed pool with the
//! partition cursors and joins before the next phase starts. Phases 3 and 4
//! write into the back territory buffers, which are swapped in afterwards.

mod context;
mod phases;

pub use context::{
    CellContext, MuscleSynapseContext, SignallingContext, SynapseContext, SynapseUpdate,
    TransitionFunctions,
};

use crate::error::Result;
use crate::metrics::EngineMetrics;
use crate::pool::WorkerPool;
use crate::tissue::DynamicState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// One step of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    SynapsesToMuscles,
    SynapsesInTissue,
    TerritorialListRedistribution,
    SynapticMigration,
    Signalling,
    Cells,
}

impl Phase {
    /// Phases in execution order.
    pub const ALL: [Self; 6] = [
        Self::SynapsesToMuscles,
        Self::SynapsesInTissue,
        Self::TerritorialListRedistribution,
        Self::SynapticMigration,
        Self::Signalling,
        Self::Cells,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SynapsesToMuscles => "synapses-to-muscles",
            Self::SynapsesInTissue => "synapses-in-tissue",
            Self::TerritorialListRedistribution => "redistribution",
            Self::SynapticMigration => "migration",
            Self::Signalling => "signalling",
            Self::Cells => "cells",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives rounds of a [`DynamicState`] with injected transition functions.
#[derive(Debug)]
pub struct TransitionEngine<T> {
    functions: T,
    pool: WorkerPool,
    time_step: u64,
    metrics: EngineMetrics,
}

impl<T: TransitionFunctions> TransitionEngine<T> {
    /// Starts a pool of `threads` workers.
    pub fn new(functions: T, threads: usize) -> Result<Self> {
        Ok(Self::with_pool(functions, WorkerPool::new(threads)?))
    }

    pub fn with_pool(functions: T, pool: WorkerPool) -> Self {
        tracing::debug!(workers = pool.workers(), "Transition engine ready");
        Self {
            functions,
            pool,
            time_step: 0,
            metrics: EngineMetrics::new(),
        }
    }

    #[inline]
    pub fn functions(&self) -> &T {
        &self.functions
    }

    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Time step handed to the functions in the next round.
    #[inline]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    #[inline]
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Runs the six phases once.
    ///
    /// # Panics
    /// When a tissue kind is still holding analyzer scratch counters, or
    /// when a transition function breaks a precondition.
    pub fn run_round(&mut self, state: &mut DynamicState) {
        assert!(
            state.all_delimiters(),
            "round started while a tissue kind holds scratch counters; \
             call fill_delimiters after compute_out_degrees"
        );

        let round_start = Instant::now();
        let time_step = self.time_step;
        for phase in Phase::ALL {
            let span = tracing::debug_span!("phase", %phase, time_step);
            let _enter = span.enter();
            let start = Instant::now();
            match phase {
                Phase::SynapsesToMuscles => {
                    phases::synapses_to_muscles(&self.pool, &self.functions, state, time_step)
                }
                Phase::SynapsesInTissue => {
                    phases::synapses_in_tissue(&self.pool, &self.functions, state, time_step)
                }
                Phase::TerritorialListRedistribution => phases::redistribute(&self.pool, state),
                Phase::SynapticMigration => phases::migrate(&self.pool, state),
                Phase::Signalling => {
                    phases::signalling(&self.pool, &self.functions, state, time_step)
                }
                Phase::Cells => phases::cells(&self.pool, &self.functions, state, time_step),
            }
            self.metrics.record_phase(phase, start.elapsed());
        }
        self.metrics.record_round(time_step, round_start.elapsed());
        self.time_step += 1;
    }

    pub fn run_rounds(&mut self, state: &mut DynamicState, rounds: u64) {
        for _ in 0..rounds {
            self.run_round(state);
        }
    }
}
