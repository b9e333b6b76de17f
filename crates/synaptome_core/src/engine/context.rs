//! Injected transition functions and the read-only views they receive.
//!
//! A context only exposes data that is not written during its phase, so
//! the result of a phase never depends on how work was split among workers.

use crate::neighbourhood::SpatialNeighbourhood;
use crate::tissue::{DynamicState, SynapseView};
use synaptome_data::{Shift, TerritorialState, TissueCoordinates};

/// New record and territorial state of a synapse in tissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SynapseUpdate {
    pub record: u64,
    pub territorial_state: TerritorialState,
}

impl SynapseUpdate {
    pub const fn new(record: u64, territorial_state: TerritorialState) -> Self {
        Self {
            record,
            territorial_state,
        }
    }

    /// Keeps the synapse settled.
    pub const fn settled(record: u64) -> Self {
        Self::new(record, TerritorialState::SignalDelivery)
    }
}

/// The four functions a simulation plugs into the engine.
///
/// Returned records must fit the configured bit-width of their buffer;
/// a wider value panics when stored.
pub trait TransitionFunctions: Sync {
    fn synapse_to_muscle(&self, ctx: &MuscleSynapseContext<'_>) -> u64;

    fn synapse_in_tissue(&self, ctx: &SynapseContext<'_>) -> SynapseUpdate;

    fn signalling(&self, ctx: &SignallingContext<'_>) -> u64;

    fn cell(&self, ctx: &CellContext<'_>) -> u64;
}

/// View of one synapse to a muscle.
///
/// Other muscle records are written in the same phase and are not exposed.
pub struct MuscleSynapseContext<'a> {
    pub(crate) state: &'a DynamicState,
    pub(crate) index: usize,
    pub(crate) time_step: u64,
}

impl MuscleSynapseContext<'_> {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    #[inline]
    pub fn record(&self) -> u64 {
        self.state.muscle_synapse(self.index)
    }

    #[inline]
    pub fn source(&self) -> TissueCoordinates {
        self.state.muscle_source(self.index)
    }

    #[inline]
    pub fn source_record(&self) -> u64 {
        self.state.source_record(self.source())
    }
}

/// View of one synapse in the territory of a tissue cell.
///
/// Other synapse records and tags are written in the same phase, so only
/// cell and sensor records are readable here.
pub struct SynapseContext<'a> {
    pub(crate) state: &'a DynamicState,
    pub(crate) coords: TissueCoordinates,
    pub(crate) slot: u32,
    pub(crate) neighbourhood: SpatialNeighbourhood,
    pub(crate) time_step: u64,
}

impl SynapseContext<'_> {
    /// The cell owning the territory.
    #[inline]
    pub fn coords(&self) -> TissueCoordinates {
        self.coords
    }

    #[inline]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    #[inline]
    pub fn kind(&self) -> u32 {
        self.state.kind_of(self.coords.c)
    }

    #[inline]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    #[inline]
    pub fn record(&self) -> u64 {
        self.state.synapse(self.coords, self.slot)
    }

    #[inline]
    pub fn territorial_state(&self) -> TerritorialState {
        self.state.territorial_state(self.coords, self.slot)
    }

    #[inline]
    pub fn source(&self) -> TissueCoordinates {
        self.state.synapse_source(self.coords, self.slot)
    }

    #[inline]
    pub fn source_record(&self) -> u64 {
        self.state.source_record(self.source())
    }

    /// Record of the cell owning the territory.
    #[inline]
    pub fn target_cell(&self) -> u64 {
        self.state.cell(self.coords)
    }

    /// Window of shifts bounded by the kind's synapse radii.
    #[inline]
    pub fn neighbourhood(&self) -> &SpatialNeighbourhood {
        &self.neighbourhood
    }

    /// Record of the tissue cell at `shift` from the owning cell.
    ///
    /// # Panics
    /// When `shift` lies outside [`neighbourhood`](Self::neighbourhood).
    #[inline]
    pub fn cell_at(&self, shift: Shift) -> u64 {
        self.state
            .cell(self.neighbourhood.resolve(self.state.config(), shift))
    }
}

/// View of one tissue cell during signalling.
///
/// Neighbour signalling records are written in the same phase and are not
/// exposed; neighbours are read through their cell records only.
pub struct SignallingContext<'a> {
    pub(crate) state: &'a DynamicState,
    pub(crate) coords: TissueCoordinates,
    pub(crate) neighbourhood: SpatialNeighbourhood,
    pub(crate) time_step: u64,
}

impl SignallingContext<'_> {
    #[inline]
    pub fn coords(&self) -> TissueCoordinates {
        self.coords
    }

    #[inline]
    pub fn kind(&self) -> u32 {
        self.state.kind_of(self.coords.c)
    }

    #[inline]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    /// Own signalling record.
    #[inline]
    pub fn record(&self) -> u64 {
        self.state.signalling(self.coords)
    }

    #[inline]
    pub fn cell(&self) -> u64 {
        self.state.cell(self.coords)
    }

    /// Window of shifts bounded by the kind's cell radii.
    #[inline]
    pub fn neighbourhood(&self) -> &SpatialNeighbourhood {
        &self.neighbourhood
    }

    /// # Panics
    /// When `shift` lies outside [`neighbourhood`](Self::neighbourhood).
    #[inline]
    pub fn cell_at(&self, shift: Shift) -> u64 {
        self.state
            .cell(self.neighbourhood.resolve(self.state.config(), shift))
    }

    pub fn territory(&self) -> impl Iterator<Item = SynapseView> + '_ {
        self.state.territory(self.coords)
    }

    pub fn list(&self, state: TerritorialState) -> impl Iterator<Item = SynapseView> + '_ {
        self.state.list(self.coords, state)
    }

    /// Record of a synapse source, tissue or sensory.
    #[inline]
    pub fn source_record(&self, source: TissueCoordinates) -> u64 {
        self.state.source_record(source)
    }
}

/// View of one tissue cell during the cell phase.
///
/// Neighbour cell records are written in the same phase and are not
/// exposed; only this cell's own records and territory are readable.
pub struct CellContext<'a> {
    pub(crate) state: &'a DynamicState,
    pub(crate) coords: TissueCoordinates,
    pub(crate) time_step: u64,
}

impl CellContext<'_> {
    #[inline]
    pub fn coords(&self) -> TissueCoordinates {
        self.coords
    }

    #[inline]
    pub fn kind(&self) -> u32 {
        self.state.kind_of(self.coords.c)
    }

    #[inline]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    #[inline]
    pub fn record(&self) -> u64 {
        self.state.cell(self.coords)
    }

    #[inline]
    pub fn signalling(&self) -> u64 {
        self.state.signalling(self.coords)
    }

    pub fn territory(&self) -> impl Iterator<Item = SynapseView> + '_ {
        self.state.territory(self.coords)
    }

    pub fn list(&self, state: TerritorialState) -> impl Iterator<Item = SynapseView> + '_ {
        self.state.list(self.coords, state)
    }
}
