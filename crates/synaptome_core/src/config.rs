//! Configuration of the tissue topology.
//!
//! [`TissueConfig`] is the serde-facing description that maps to a
//! `tissue.toml` file. [`StaticConfig`] is built once from a validated
//! `TissueConfig`, caches every derived quantity the storage layer needs and
//! is never mutated afterwards.
//!
//! ## Example `tissue.toml`
//!
//! ```toml
//! size_x = 32
//! size_y = 32
//! synapses_to_muscles = 64
//!
//! [[cell_kinds]]
//! cells_per_column = 4
//! territory_capacity = 16
//! cell_radius = { x = 1, y = 1, columnar = 1 }
//! synapse_radius = { x = 2, y = 2, columnar = 0 }
//!
//! [[sensory_kinds]]
//! cells_per_column = 2
//!
//! [bits]
//! cell = 16
//! sensory = 8
//! synapse = 16
//! synapse_to_muscle = 16
//! signalling = 16
//!
//! [torus]
//! x = true
//! y = true
//! columnar = false
//! ```

use crate::error::{Result, TissueError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use synaptome_data::{NeighbourhoodRadii, NUM_DELIMITERS};

/// One kind of tissue cell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellKindConfig {
    /// Cells of this kind stacked in every column.
    pub cells_per_column: u32,
    /// Synapse slots owned by each cell of this kind.
    pub territory_capacity: u32,
    #[serde(default)]
    pub cell_radius: NeighbourhoodRadii,
    #[serde(default)]
    pub synapse_radius: NeighbourhoodRadii,
}

/// One kind of sensory cell. Sensory cells have no territory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SensoryKindConfig {
    pub cells_per_column: u32,
}

/// Bit-widths of the packed records.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordBits {
    pub cell: u32,
    pub sensory: u32,
    pub synapse: u32,
    pub synapse_to_muscle: u32,
    pub signalling: u32,
}

impl Default for RecordBits {
    fn default() -> Self {
        Self {
            cell: 16,
            sensory: 8,
            synapse: 16,
            synapse_to_muscle: 16,
            signalling: 16,
        }
    }
}

/// Which axes wrap around.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorusConfig {
    pub x: bool,
    pub y: bool,
    pub columnar: bool,
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            x: true,
            y: true,
            columnar: false,
        }
    }
}

/// Serializable description of a tissue.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TissueConfig {
    pub size_x: u32,
    pub size_y: u32,
    #[serde(default)]
    pub synapses_to_muscles: u32,
    #[serde(default)]
    pub bits: RecordBits,
    #[serde(default)]
    pub torus: TorusConfig,
    pub cell_kinds: Vec<CellKindConfig>,
    #[serde(default)]
    pub sensory_kinds: Vec<SensoryKindConfig>,
}

impl Default for TissueConfig {
    fn default() -> Self {
        Self {
            size_x: 16,
            size_y: 16,
            synapses_to_muscles: 32,
            bits: RecordBits::default(),
            torus: TorusConfig::default(),
            cell_kinds: vec![
                CellKindConfig {
                    cells_per_column: 4,
                    territory_capacity: 16,
                    cell_radius: NeighbourhoodRadii::uniform(1),
                    synapse_radius: NeighbourhoodRadii::new(1, 1, 0),
                },
                CellKindConfig {
                    cells_per_column: 2,
                    territory_capacity: 24,
                    cell_radius: NeighbourhoodRadii::new(2, 2, 1),
                    synapse_radius: NeighbourhoodRadii::new(1, 1, 1),
                },
            ],
            sensory_kinds: vec![SensoryKindConfig {
                cells_per_column: 2,
            }],
        }
    }
}

impl TissueConfig {
    /// Validates every parameter; a `StaticConfig` can only be built from a
    /// config that passes.
    pub fn validate(&self) -> Result<()> {
        if self.size_x == 0 || self.size_y == 0 {
            return Err(TissueError::extent(format!(
                "grid extents must be positive, got {}x{}",
                self.size_x, self.size_y
            )));
        }
        if self.cell_kinds.is_empty() {
            return Err(TissueError::kind(0, "at least one tissue cell kind is required"));
        }

        for (record, bits) in [
            ("cell", self.bits.cell),
            ("sensory", self.bits.sensory),
            ("synapse", self.bits.synapse),
            ("synapse_to_muscle", self.bits.synapse_to_muscle),
            ("signalling", self.bits.signalling),
        ] {
            if !(1..=64).contains(&bits) {
                return Err(TissueError::BitWidth { record, bits });
            }
        }

        let mut tissue_length = 0u64;
        for (kind, k) in self.cell_kinds.iter().enumerate() {
            if k.cells_per_column == 0 {
                return Err(TissueError::kind(kind, "zero cells per column"));
            }
            tissue_length += u64::from(k.cells_per_column);
        }
        let mut columnar_length = tissue_length;
        for (i, s) in self.sensory_kinds.iter().enumerate() {
            if s.cells_per_column == 0 {
                return Err(TissueError::kind(
                    self.cell_kinds.len() + i,
                    "sensory kind with zero cells per column",
                ));
            }
            columnar_length += u64::from(s.cells_per_column);
        }
        // The sentinel for "no neighbour" is the axis length itself.
        if columnar_length >= u64::from(u32::MAX) {
            return Err(TissueError::layout(format!(
                "columnar axis of {columnar_length} cells is too long"
            )));
        }

        for (kind, k) in self.cell_kinds.iter().enumerate() {
            for (name, radii) in [("cell", k.cell_radius), ("synapse", k.synapse_radius)] {
                let lengths = [
                    u64::from(self.size_x),
                    u64::from(self.size_y),
                    tissue_length,
                ];
                for (axis, (&r, &len)) in ["x", "y", "columnar"]
                    .iter()
                    .zip(radii.as_array().iter().zip(lengths.iter()))
                {
                    if u64::from(r) > len || r > i32::MAX as u32 {
                        return Err(TissueError::radius(
                            kind,
                            format!("{name} radius {r} along {axis} exceeds axis length {len}"),
                        ));
                    }
                }
            }
        }

        let columns = u64::from(self.size_x) * u64::from(self.size_y);
        let synapses_per_column: u64 = self
            .cell_kinds
            .iter()
            .map(|k| u64::from(k.cells_per_column) * u64::from(k.territory_capacity))
            .sum();
        let total_bits = columns
            .checked_mul(synapses_per_column)
            .and_then(|n| n.checked_mul(64));
        if total_bits.is_none() {
            return Err(TissueError::layout(
                "synapse buffers exceed the addressable bit range",
            ));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading tissue config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Number of bits needed to store every value in `0..=max`.
#[inline]
pub(crate) fn bits_for(max: u64) -> u32 {
    (64 - max.leading_zeros()).max(1)
}

/// Immutable tissue topology with cached derived layout.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    source: TissueConfig,
    /// Columnar offset of every kind, tissue kinds first; one extra entry
    /// holds the total columnar length.
    kind_offsets: Vec<u32>,
    /// Kind id per columnar coordinate.
    kind_table: Vec<u32>,
    /// Offset of the first synapse of every tissue kind within a column.
    synapse_offsets: Vec<u64>,
    synapses_per_column: u64,
    coordinate_bits: [u32; 3],
    delimiter_bits: u32,
    delimiter_stride: u32,
}

impl StaticConfig {
    pub fn new(config: TissueConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| e.with_context("building static config"))?;

        let num_kinds = config.cell_kinds.len() + config.sensory_kinds.len();
        let mut kind_offsets = Vec::with_capacity(num_kinds + 1);
        let mut offset = 0u32;
        let counts = config
            .cell_kinds
            .iter()
            .map(|k| k.cells_per_column)
            .chain(config.sensory_kinds.iter().map(|s| s.cells_per_column));
        let mut kind_table = Vec::new();
        for (kind, count) in counts.enumerate() {
            kind_offsets.push(offset);
            kind_table.extend(std::iter::repeat(kind as u32).take(count as usize));
            offset += count;
        }
        kind_offsets.push(offset);

        let mut synapse_offsets = Vec::with_capacity(config.cell_kinds.len());
        let mut synapses_per_column = 0u64;
        for k in &config.cell_kinds {
            synapse_offsets.push(synapses_per_column);
            synapses_per_column += u64::from(k.cells_per_column) * u64::from(k.territory_capacity);
        }

        let max_capacity = config
            .cell_kinds
            .iter()
            .map(|k| k.territory_capacity)
            .max()
            .unwrap_or(0);
        let delimiter_bits = bits_for(u64::from(max_capacity));
        let delimiter_stride = (delimiter_bits * NUM_DELIMITERS as u32).max(32);

        let coordinate_bits = [
            bits_for(u64::from(config.size_x - 1)),
            bits_for(u64::from(config.size_y - 1)),
            bits_for(u64::from(offset.saturating_sub(1))),
        ];

        tracing::debug!(
            size_x = config.size_x,
            size_y = config.size_y,
            columnar = offset,
            synapses_per_column,
            "Static tissue config built"
        );

        Ok(Self {
            source: config,
            kind_offsets,
            kind_table,
            synapse_offsets,
            synapses_per_column,
            coordinate_bits,
            delimiter_bits,
            delimiter_stride,
        })
    }

    #[inline]
    pub fn tissue_config(&self) -> &TissueConfig {
        &self.source
    }

    #[inline]
    pub fn size_x(&self) -> u32 {
        self.source.size_x
    }

    #[inline]
    pub fn size_y(&self) -> u32 {
        self.source.size_y
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.source.size_x as usize * self.source.size_y as usize
    }

    #[inline]
    pub fn column_index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.size_x() && y < self.size_y(),
            "column ({x}, {y}) outside {}x{} tissue",
            self.size_x(),
            self.size_y()
        );
        y as usize * self.size_x() as usize + x as usize
    }

    #[inline]
    pub fn column_coordinates(&self, column: usize) -> (u32, u32) {
        let sx = self.size_x() as usize;
        ((column % sx) as u32, (column / sx) as u32)
    }

    #[inline]
    pub fn num_tissue_kinds(&self) -> u32 {
        self.source.cell_kinds.len() as u32
    }

    #[inline]
    pub fn num_sensory_kinds(&self) -> u32 {
        self.source.sensory_kinds.len() as u32
    }

    #[inline]
    pub fn num_kinds(&self) -> u32 {
        self.num_tissue_kinds() + self.num_sensory_kinds()
    }

    #[inline]
    pub fn num_tissue_cells_per_column(&self) -> u32 {
        self.kind_offsets[self.num_tissue_kinds() as usize]
    }

    #[inline]
    pub fn num_sensory_cells_per_column(&self) -> u32 {
        self.total_columnar_length() - self.num_tissue_cells_per_column()
    }

    #[inline]
    pub fn total_columnar_length(&self) -> u32 {
        self.kind_offsets[self.kind_offsets.len() - 1]
    }

    /// Axis lengths used for neighbourhood shifts. The columnar axis spans
    /// tissue cells only.
    #[inline]
    pub fn axis_lengths(&self) -> [u32; 3] {
        [
            self.size_x(),
            self.size_y(),
            self.num_tissue_cells_per_column(),
        ]
    }

    #[inline]
    pub fn torus_flags(&self) -> [bool; 3] {
        let t = self.source.torus;
        [t.x, t.y, t.columnar]
    }

    /// Kind of the cell at columnar coordinate `c`, tissue or sensory.
    #[inline]
    pub fn kind_of(&self, c: u32) -> u32 {
        assert!(
            c < self.total_columnar_length(),
            "columnar coordinate {c} outside column of length {}",
            self.total_columnar_length()
        );
        self.kind_table[c as usize]
    }

    #[inline]
    pub fn is_tissue(&self, c: u32) -> bool {
        c < self.num_tissue_cells_per_column()
    }

    #[inline]
    pub fn is_tissue_kind(&self, kind: u32) -> bool {
        kind < self.num_tissue_kinds()
    }

    /// Columnar coordinates occupied by `kind`.
    #[inline]
    pub fn kind_range(&self, kind: u32) -> Range<u32> {
        assert!(kind < self.num_kinds(), "unknown cell kind {kind}");
        self.kind_offsets[kind as usize]..self.kind_offsets[kind as usize + 1]
    }

    #[inline]
    fn tissue_kind(&self, kind: u32) -> &CellKindConfig {
        assert!(
            self.is_tissue_kind(kind),
            "kind {kind} is not a tissue cell kind"
        );
        &self.source.cell_kinds[kind as usize]
    }

    #[inline]
    pub fn cells_per_column(&self, kind: u32) -> u32 {
        let range = self.kind_range(kind);
        range.end - range.start
    }

    #[inline]
    pub fn territory_capacity(&self, kind: u32) -> u32 {
        self.tissue_kind(kind).territory_capacity
    }

    #[inline]
    pub fn cell_radius(&self, kind: u32) -> NeighbourhoodRadii {
        self.tissue_kind(kind).cell_radius
    }

    #[inline]
    pub fn synapse_radius(&self, kind: u32) -> NeighbourhoodRadii {
        self.tissue_kind(kind).synapse_radius
    }

    #[inline]
    pub fn bits(&self) -> RecordBits {
        self.source.bits
    }

    #[inline]
    pub fn synapses_to_muscles(&self) -> u32 {
        self.source.synapses_to_muscles
    }

    #[inline]
    pub fn synapses_per_column(&self) -> u64 {
        self.synapses_per_column
    }

    /// Offset of the territory of tissue cell `c` within its column.
    #[inline]
    pub fn territory_offset(&self, c: u32) -> u64 {
        let kind = self.kind_of(c);
        let k = self.tissue_kind(kind);
        self.synapse_offsets[kind as usize]
            + u64::from(c - self.kind_offsets[kind as usize]) * u64::from(k.territory_capacity)
    }

    /// Bits per stored x, y and columnar source coordinate.
    #[inline]
    pub fn coordinate_bits(&self) -> [u32; 3] {
        self.coordinate_bits
    }

    #[inline]
    pub fn delimiter_bits(&self) -> u32 {
        self.delimiter_bits
    }

    /// Bits reserved per cell for its six delimiters; at least 32 so the
    /// scratch counter fits.
    #[inline]
    pub fn delimiter_stride(&self) -> u32 {
        self.delimiter_stride
    }
}
