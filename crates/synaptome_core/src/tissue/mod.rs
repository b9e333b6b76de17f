//! Bit-packed mutable state of a tissue.
//!
//! Every record lives in a flat buffer of atomic words, columns contiguous in
//! memory: cell `(x, y, c)` is stored at `(y * size_x + x) * per_column + c`
//! and its territory slots follow the same column-major order. All accessors
//! take `&self`, so one `DynamicState` can be shared by reference among the
//! workers of a phase as long as they write disjoint fields.

mod territory;

pub use territory::{DelimiterMode, SynapseView, SCRATCH_COUNTER_BITS, TERRITORIAL_STATE_BITS};
pub(crate) use territory::TerritoryBuffers;

use crate::bits::PackedArray;
use crate::config::StaticConfig;
use crate::error::TerritoryViolation;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use synaptome_data::{
    Delimiters, TerritorialLists, TerritorialState, TissueCoordinates, NUM_TERRITORIAL_STATES,
};

/// Mutable records of one simulated tissue.
#[derive(Debug, Clone)]
pub struct DynamicState {
    config: Arc<StaticConfig>,
    cells: PackedArray,
    sensors: PackedArray,
    signalling: PackedArray,
    territories: TerritoryBuffers,
    back_territories: TerritoryBuffers,
    muscles: PackedArray,
    muscle_source_x: PackedArray,
    muscle_source_y: PackedArray,
    muscle_source_c: PackedArray,
    delimiter_modes: Vec<DelimiterMode>,
}

impl DynamicState {
    /// All records zero, all sources `(0, 0, 0)` and every territory settled
    /// entirely in the signal-delivery list.
    pub fn new(config: Arc<StaticConfig>) -> Self {
        let bits = config.bits();
        let columns = config.num_columns();
        let tissue_cells = columns * config.num_tissue_cells_per_column() as usize;
        let sensory_cells = columns * config.num_sensory_cells_per_column() as usize;
        let muscles = config.synapses_to_muscles() as usize;
        let [bx, by, bc] = config.coordinate_bits();

        let state = Self {
            cells: PackedArray::new(tissue_cells, bits.cell),
            sensors: PackedArray::new(sensory_cells, bits.sensory),
            signalling: PackedArray::new(tissue_cells, bits.signalling),
            territories: TerritoryBuffers::new(&config),
            back_territories: TerritoryBuffers::new(&config),
            muscles: PackedArray::new(muscles, bits.synapse_to_muscle),
            muscle_source_x: PackedArray::new(muscles, bx),
            muscle_source_y: PackedArray::new(muscles, by),
            muscle_source_c: PackedArray::new(muscles, bc),
            delimiter_modes: vec![DelimiterMode::Delimiters; config.num_tissue_kinds() as usize],
            config,
        };

        let per_column = state.config.num_tissue_cells_per_column() as usize;
        (0..tissue_cells).into_par_iter().for_each(|cell| {
            let c = (cell % per_column) as u32;
            let capacity = state.config.territory_capacity(state.config.kind_of(c));
            state
                .territories
                .set_delimiters(cell, &Delimiters::settled(capacity));
        });

        tracing::debug!(
            tissue_cells,
            sensory_cells,
            muscles,
            "Dynamic tissue state allocated"
        );
        state
    }

    #[inline]
    pub fn config(&self) -> &Arc<StaticConfig> {
        &self.config
    }

    // Addressing

    #[inline]
    fn cell_index(&self, coords: TissueCoordinates) -> usize {
        let per_column = self.config.num_tissue_cells_per_column();
        assert!(
            coords.c < per_column,
            "{coords} is not a tissue cell (column holds {per_column})"
        );
        self.config.column_index(coords.x, coords.y) * per_column as usize + coords.c as usize
    }

    #[inline]
    fn sensor_index(&self, coords: TissueCoordinates) -> usize {
        let tissue = self.config.num_tissue_cells_per_column();
        let sensory = self.config.num_sensory_cells_per_column();
        assert!(
            coords.c >= tissue && coords.c < tissue + sensory,
            "{coords} is not a sensory cell"
        );
        self.config.column_index(coords.x, coords.y) * sensory as usize
            + (coords.c - tissue) as usize
    }

    /// Global index of the first slot of the territory of `coords`.
    #[inline]
    fn territory_base(&self, coords: TissueCoordinates) -> usize {
        let column = self.config.column_index(coords.x, coords.y);
        column * self.config.synapses_per_column() as usize
            + self.config.territory_offset(coords.c) as usize
    }

    #[inline]
    fn synapse_index(&self, coords: TissueCoordinates, slot: u32) -> usize {
        let capacity = self.capacity_of(coords);
        assert!(
            slot < capacity,
            "slot {slot} outside territory of {coords} (capacity {capacity})"
        );
        self.territory_base(coords) + slot as usize
    }

    #[inline]
    fn assert_source(&self, source: TissueCoordinates) {
        assert!(
            source.x < self.config.size_x()
                && source.y < self.config.size_y()
                && source.c < self.config.total_columnar_length(),
            "source {source} addresses no cell"
        );
    }

    /// Kind of the cell at columnar coordinate `c`.
    #[inline]
    pub fn kind_of(&self, c: u32) -> u32 {
        self.config.kind_of(c)
    }

    /// Territory capacity of the tissue cell at `coords`.
    #[inline]
    pub fn capacity_of(&self, coords: TissueCoordinates) -> u32 {
        assert!(
            self.config.is_tissue(coords.c),
            "{coords} is not a tissue cell"
        );
        self.config.territory_capacity(self.config.kind_of(coords.c))
    }

    // Cells, sensors and signalling

    #[inline]
    pub fn cell(&self, coords: TissueCoordinates) -> u64 {
        self.cells.get(self.cell_index(coords))
    }

    #[inline]
    pub fn set_cell(&self, coords: TissueCoordinates, record: u64) {
        self.cells.set(self.cell_index(coords), record);
    }

    #[inline]
    pub fn sensor(&self, coords: TissueCoordinates) -> u64 {
        self.sensors.get(self.sensor_index(coords))
    }

    #[inline]
    pub fn set_sensor(&self, coords: TissueCoordinates, record: u64) {
        self.sensors.set(self.sensor_index(coords), record);
    }

    /// Record of a synapse source: a tissue cell or a sensory cell.
    #[inline]
    pub fn source_record(&self, source: TissueCoordinates) -> u64 {
        if self.config.is_tissue(source.c) {
            self.cell(source)
        } else {
            self.sensor(source)
        }
    }

    #[inline]
    pub fn signalling(&self, coords: TissueCoordinates) -> u64 {
        self.signalling.get(self.cell_index(coords))
    }

    #[inline]
    pub fn set_signalling(&self, coords: TissueCoordinates, record: u64) {
        self.signalling.set(self.cell_index(coords), record);
    }

    // Synapses in tissue

    #[inline]
    pub fn synapse(&self, coords: TissueCoordinates, slot: u32) -> u64 {
        self.territories.record(self.synapse_index(coords, slot))
    }

    #[inline]
    pub fn set_synapse(&self, coords: TissueCoordinates, slot: u32, record: u64) {
        self.territories
            .set_record(self.synapse_index(coords, slot), record);
    }

    #[inline]
    pub fn synapse_source(&self, coords: TissueCoordinates, slot: u32) -> TissueCoordinates {
        self.territories.source(self.synapse_index(coords, slot))
    }

    /// # Panics
    /// When `source` addresses no tissue or sensory cell.
    #[inline]
    pub fn set_synapse_source(
        &self,
        coords: TissueCoordinates,
        slot: u32,
        source: TissueCoordinates,
    ) {
        self.assert_source(source);
        self.territories
            .set_source(self.synapse_index(coords, slot), source);
    }

    #[inline]
    pub fn territorial_state(&self, coords: TissueCoordinates, slot: u32) -> TerritorialState {
        self.territories.state(self.synapse_index(coords, slot))
    }

    /// Retags a slot without moving it; delimiters are left stale until the
    /// next redistribution or fill.
    #[inline]
    pub(crate) fn set_territorial_state(
        &self,
        coords: TissueCoordinates,
        slot: u32,
        state: TerritorialState,
    ) {
        self.territories
            .set_state(self.synapse_index(coords, slot), state);
    }

    /// Every slot of the territory of `coords`, in slot order.
    pub fn territory(
        &self,
        coords: TissueCoordinates,
    ) -> impl Iterator<Item = SynapseView> + '_ {
        let base = self.territory_base(coords);
        (0..self.capacity_of(coords)).map(move |slot| self.view(base, slot))
    }

    /// The synapses of one territorial list of `coords`.
    pub fn list(
        &self,
        coords: TissueCoordinates,
        state: TerritorialState,
    ) -> impl Iterator<Item = SynapseView> + '_ {
        let base = self.territory_base(coords);
        self.territorial_lists(coords)
            .range(state)
            .map(move |slot| self.view(base, slot))
    }

    #[inline]
    fn view(&self, base: usize, slot: u32) -> SynapseView {
        let index = base + slot as usize;
        SynapseView {
            slot,
            record: self.territories.record(index),
            source: self.territories.source(index),
            territorial_state: self.territories.state(index),
        }
    }

    // Delimiters and scratch counters

    #[inline]
    pub fn delimiter_mode(&self, kind: u32) -> DelimiterMode {
        assert!(
            self.config.is_tissue_kind(kind),
            "kind {kind} is not a tissue cell kind"
        );
        self.delimiter_modes[kind as usize]
    }

    #[inline]
    pub(crate) fn set_delimiter_mode(&mut self, kind: u32, mode: DelimiterMode) {
        assert!(
            self.config.is_tissue_kind(kind),
            "kind {kind} is not a tissue cell kind"
        );
        self.delimiter_modes[kind as usize] = mode;
    }

    /// True when no kind is holding scratch counters.
    pub fn all_delimiters(&self) -> bool {
        self.delimiter_modes
            .iter()
            .all(|&m| m == DelimiterMode::Delimiters)
    }

    #[inline]
    fn expect_mode(&self, coords: TissueCoordinates, mode: DelimiterMode) -> usize {
        let kind = self.kind_of(coords.c);
        let current = self.delimiter_mode(kind);
        assert!(
            current == mode,
            "kind {kind} holds {current}, {mode} requested for {coords}; \
             fill_delimiters restores delimiters after an analysis"
        );
        self.cell_index(coords)
    }

    /// # Panics
    /// When the cell's kind is holding scratch counters.
    #[inline]
    pub fn delimiters(&self, coords: TissueCoordinates) -> Delimiters {
        let cell = self.expect_mode(coords, DelimiterMode::Delimiters);
        self.territories.delimiters(cell)
    }

    /// # Panics
    /// When the cell's kind is holding scratch counters.
    #[inline]
    pub fn territorial_lists(&self, coords: TissueCoordinates) -> TerritorialLists {
        TerritorialLists::new(self.delimiters(coords), self.capacity_of(coords))
    }

    #[inline]
    pub(crate) fn store_delimiters(&self, coords: TissueCoordinates, delimiters: &Delimiters) {
        let cell = self.cell_index(coords);
        self.territories.reset_delimiters(cell, delimiters);
    }

    /// Out-degree counter left by the analyzer.
    ///
    /// # Panics
    /// When the cell's kind is holding delimiters.
    #[inline]
    pub fn scratch_counter(&self, coords: TissueCoordinates) -> u32 {
        let cell = self.expect_mode(coords, DelimiterMode::ScratchCounters);
        self.territories.counter(cell)
    }

    #[inline]
    pub(crate) fn set_scratch_counter(&self, coords: TissueCoordinates, value: u32) {
        let cell = self.expect_mode(coords, DelimiterMode::ScratchCounters);
        self.territories.set_counter(cell, value);
    }

    /// Verifies that every slot of `coords` carries the tag of the list its
    /// delimiters place it in.
    pub fn check_territory(&self, coords: TissueCoordinates) -> Result<(), TerritoryViolation> {
        let lists = self.territorial_lists(coords);
        for synapse in self.territory(coords) {
            let expected = lists.state_of_slot(synapse.slot);
            if synapse.territorial_state != expected {
                return Err(TerritoryViolation {
                    coords,
                    slot: synapse.slot,
                    expected,
                    found: synapse.territorial_state,
                });
            }
        }
        Ok(())
    }

    /// Runs [`check_territory`](Self::check_territory) over every tissue
    /// cell, reporting the first violation in memory order.
    pub fn check_all_territories(&self) -> Result<(), TerritoryViolation> {
        let per_column = self.config.num_tissue_cells_per_column();
        (0..self.config.num_columns()).try_for_each(|column| {
            let (x, y) = self.config.column_coordinates(column);
            (0..per_column)
                .try_for_each(|c| self.check_territory(TissueCoordinates::new(x, y, c)))
        })
    }

    // Synapses to muscles

    #[inline]
    pub fn num_muscle_synapses(&self) -> usize {
        self.muscles.len()
    }

    #[inline]
    pub fn muscle_synapse(&self, index: usize) -> u64 {
        self.muscles.get(index)
    }

    #[inline]
    pub fn set_muscle_synapse(&self, index: usize, record: u64) {
        self.muscles.set(index, record);
    }

    #[inline]
    pub fn muscle_source(&self, index: usize) -> TissueCoordinates {
        TissueCoordinates::new(
            self.muscle_source_x.get(index) as u32,
            self.muscle_source_y.get(index) as u32,
            self.muscle_source_c.get(index) as u32,
        )
    }

    /// # Panics
    /// When `source` addresses no tissue or sensory cell.
    #[inline]
    pub fn set_muscle_source(&self, index: usize, source: TissueCoordinates) {
        self.assert_source(source);
        self.muscle_source_x.set(index, u64::from(source.x));
        self.muscle_source_y.set(index, u64::from(source.y));
        self.muscle_source_c.set(index, u64::from(source.c));
    }

    // Double buffering

    #[inline]
    pub(crate) fn front(&self) -> &TerritoryBuffers {
        &self.territories
    }

    #[inline]
    pub(crate) fn back(&self) -> &TerritoryBuffers {
        &self.back_territories
    }

    /// Global slot index of `(coords, slot)`, shared by both buffers.
    #[inline]
    pub(crate) fn slot_index(&self, coords: TissueCoordinates, slot: u32) -> usize {
        self.synapse_index(coords, slot)
    }

    #[inline]
    pub(crate) fn cell_slot(&self, coords: TissueCoordinates) -> usize {
        self.cell_index(coords)
    }

    /// Stably regroups the territory of `coords` by tag from the front into
    /// the back buffers. Returns the delimiters of the regrouped lists.
    pub(crate) fn regroup_into_back(&self, coords: TissueCoordinates) -> Delimiters {
        let base = self.territory_base(coords);
        let capacity = self.capacity_of(coords) as usize;
        let front = &self.territories;
        let back = &self.back_territories;

        let mut sizes = [0u32; NUM_TERRITORIAL_STATES];
        for slot in 0..capacity {
            sizes[front.state(base + slot).index()] += 1;
        }
        let lists = TerritorialLists::from_sizes(sizes);
        let mut next = TerritorialState::ALL.map(|state| lists.begin(state) as usize);
        for slot in 0..capacity {
            let state = front.state(base + slot);
            let target = &mut next[state.index()];
            back.copy_from(base + *target, front, base + slot, state);
            *target += 1;
        }
        lists.delimiters()
    }

    /// Copies the back territory of `coords` over the front one.
    pub(crate) fn restore_from_back(&self, coords: TissueCoordinates) {
        let base = self.territory_base(coords);
        for slot in 0..self.capacity_of(coords) as usize {
            let index = base + slot;
            let state = self.back_territories.state(index);
            self.territories
                .copy_from(index, &self.back_territories, index, state);
        }
    }

    pub(crate) fn swap_territories(&mut self) {
        std::mem::swap(&mut self.territories, &mut self.back_territories);
    }

    /// SHA-256 over every live buffer and the delimiter modes.
    ///
    /// Equal fingerprints mean equal tissues; the back territory buffers are
    /// scratch space and excluded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.tissue_config().fingerprint().as_bytes());
        self.cells.digest_into(&mut hasher);
        self.sensors.digest_into(&mut hasher);
        self.signalling.digest_into(&mut hasher);
        self.territories.digest_into(&mut hasher);
        for array in [
            &self.muscles,
            &self.muscle_source_x,
            &self.muscle_source_y,
            &self.muscle_source_c,
        ] {
            array.digest_into(&mut hasher);
        }
        for mode in &self.delimiter_modes {
            hasher.update([*mode as u8]);
        }
        hex::encode(hasher.finalize())
    }
}
