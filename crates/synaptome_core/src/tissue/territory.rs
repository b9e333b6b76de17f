//! Per-slot synapse storage shared by the front and back territory buffers.

use crate::bits::{BitBuffer, PackedArray};
use crate::config::StaticConfig;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use synaptome_data::{Delimiters, TerritorialState, TissueCoordinates, NUM_DELIMITERS};

/// Bits of the territorial state tag.
pub const TERRITORIAL_STATE_BITS: u32 = 3;

/// Bits of the scratch counter aliased on a cell's delimiters.
pub const SCRATCH_COUNTER_BITS: u32 = 32;

/// What the delimiter words of a tissue kind currently hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DelimiterMode {
    /// Six list boundaries per cell; rounds may run.
    #[default]
    Delimiters,
    /// One 32-bit out-degree counter per cell, left by the analyzer.
    ScratchCounters,
}

impl fmt::Display for DelimiterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimiters => write!(f, "delimiters"),
            Self::ScratchCounters => write!(f, "scratch counters"),
        }
    }
}

/// One synapse as seen from its owning cell's territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SynapseView {
    pub slot: u32,
    pub record: u64,
    pub source: TissueCoordinates,
    pub territorial_state: TerritorialState,
}

/// Synapse records, tags, sources and delimiters of every territory.
///
/// Indices are global synapse indices and global tissue cell indices; the
/// owning [`DynamicState`](super::DynamicState) does the addressing.
#[derive(Debug, Clone)]
pub(crate) struct TerritoryBuffers {
    records: PackedArray,
    states: PackedArray,
    source_x: PackedArray,
    source_y: PackedArray,
    source_c: PackedArray,
    delimiters: BitBuffer,
    delimiter_bits: u32,
    delimiter_stride: u32,
}

impl TerritoryBuffers {
    pub(crate) fn new(config: &StaticConfig) -> Self {
        let synapses = config.num_columns() * config.synapses_per_column() as usize;
        let cells = config.num_columns() * config.num_tissue_cells_per_column() as usize;
        let [bx, by, bc] = config.coordinate_bits();
        let stride = config.delimiter_stride();
        Self {
            records: PackedArray::new(synapses, config.bits().synapse),
            states: PackedArray::new(synapses, TERRITORIAL_STATE_BITS),
            source_x: PackedArray::new(synapses, bx),
            source_y: PackedArray::new(synapses, by),
            source_c: PackedArray::new(synapses, bc),
            delimiters: BitBuffer::new(cells as u64 * u64::from(stride)),
            delimiter_bits: config.delimiter_bits(),
            delimiter_stride: stride,
        }
    }

    #[inline]
    pub(crate) fn record(&self, synapse: usize) -> u64 {
        self.records.get(synapse)
    }

    #[inline]
    pub(crate) fn set_record(&self, synapse: usize, record: u64) {
        self.records.set(synapse, record);
    }

    #[inline]
    pub(crate) fn state(&self, synapse: usize) -> TerritorialState {
        TerritorialState::from_tag(self.states.get(synapse))
    }

    #[inline]
    pub(crate) fn set_state(&self, synapse: usize, state: TerritorialState) {
        self.states.set(synapse, u64::from(state.tag()));
    }

    #[inline]
    pub(crate) fn source(&self, synapse: usize) -> TissueCoordinates {
        TissueCoordinates::new(
            self.source_x.get(synapse) as u32,
            self.source_y.get(synapse) as u32,
            self.source_c.get(synapse) as u32,
        )
    }

    #[inline]
    pub(crate) fn set_source(&self, synapse: usize, source: TissueCoordinates) {
        self.source_x.set(synapse, u64::from(source.x));
        self.source_y.set(synapse, u64::from(source.y));
        self.source_c.set(synapse, u64::from(source.c));
    }

    /// Copies record and source of `from[src]` into slot `dst`, tagging it
    /// with `state`.
    #[inline]
    pub(crate) fn copy_from(
        &self,
        dst: usize,
        from: &TerritoryBuffers,
        src: usize,
        state: TerritorialState,
    ) {
        self.set_record(dst, from.record(src));
        self.set_source(dst, from.source(src));
        self.set_state(dst, state);
    }

    #[inline]
    fn delimiter_offset(&self, cell: usize, j: usize) -> u64 {
        cell as u64 * u64::from(self.delimiter_stride)
            + (j as u64) * u64::from(self.delimiter_bits)
    }

    pub(crate) fn delimiters(&self, cell: usize) -> Delimiters {
        let mut values = [0u32; NUM_DELIMITERS];
        for (j, value) in values.iter_mut().enumerate() {
            *value = self
                .delimiters
                .load(self.delimiter_offset(cell, j), self.delimiter_bits) as u32;
        }
        Delimiters(values)
    }

    pub(crate) fn set_delimiters(&self, cell: usize, delimiters: &Delimiters) {
        for (j, &value) in delimiters.0.iter().enumerate() {
            self.delimiters.store(
                self.delimiter_offset(cell, j),
                self.delimiter_bits,
                u64::from(value),
            );
        }
    }

    /// Zeroes the whole stride of `cell` before writing `delimiters`, so no
    /// scratch counter bits survive past the last delimiter.
    pub(crate) fn reset_delimiters(&self, cell: usize, delimiters: &Delimiters) {
        let base = self.delimiter_offset(cell, 0);
        let mut cleared = 0u32;
        while cleared < self.delimiter_stride {
            let width = (self.delimiter_stride - cleared).min(64);
            self.delimiters.store(base + u64::from(cleared), width, 0);
            cleared += width;
        }
        self.set_delimiters(cell, delimiters);
    }

    #[inline]
    pub(crate) fn counter(&self, cell: usize) -> u32 {
        self.delimiters
            .load(self.delimiter_offset(cell, 0), SCRATCH_COUNTER_BITS) as u32
    }

    #[inline]
    pub(crate) fn set_counter(&self, cell: usize, value: u32) {
        self.delimiters.store(
            self.delimiter_offset(cell, 0),
            SCRATCH_COUNTER_BITS,
            u64::from(value),
        );
    }

    pub(crate) fn digest_into(&self, hasher: &mut Sha256) {
        for array in [
            &self.records,
            &self.states,
            &self.source_x,
            &self.source_y,
            &self.source_c,
        ] {
            array.digest_into(hasher);
        }
        self.delimiters.digest_into(hasher);
    }
}
