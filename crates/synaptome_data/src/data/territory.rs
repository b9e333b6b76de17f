use crate::data::coordinates::Shift;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Number of territorial states a synapse can be in.
pub const NUM_TERRITORIAL_STATES: usize = 7;
/// Number of boundaries splitting a territory into territorial lists.
pub const NUM_DELIMITERS: usize = NUM_TERRITORIAL_STATES - 1;

/// Migration/settlement status of a synapse within the territory of its cell.
///
/// Stored as a 3-bit tag; tag `7` is never valid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum TerritorialState {
    /// Settled; delivers signals to the owning cell.
    #[default]
    SignalDelivery = 0,
    MigrationPositiveX = 1,
    MigrationNegativeX = 2,
    MigrationPositiveY = 3,
    MigrationNegativeY = 4,
    MigrationPositiveColumnar = 5,
    MigrationNegativeColumnar = 6,
}

impl TerritorialState {
    pub const ALL: [Self; NUM_TERRITORIAL_STATES] = [
        Self::SignalDelivery,
        Self::MigrationPositiveX,
        Self::MigrationNegativeX,
        Self::MigrationPositiveY,
        Self::MigrationNegativeY,
        Self::MigrationPositiveColumnar,
        Self::MigrationNegativeColumnar,
    ];

    pub const MIGRATIONS: [Self; NUM_DELIMITERS] = [
        Self::MigrationPositiveX,
        Self::MigrationNegativeX,
        Self::MigrationPositiveY,
        Self::MigrationNegativeY,
        Self::MigrationPositiveColumnar,
        Self::MigrationNegativeColumnar,
    ];

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn try_from_tag(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(Self::SignalDelivery),
            1 => Some(Self::MigrationPositiveX),
            2 => Some(Self::MigrationNegativeX),
            3 => Some(Self::MigrationPositiveY),
            4 => Some(Self::MigrationNegativeY),
            5 => Some(Self::MigrationPositiveColumnar),
            6 => Some(Self::MigrationNegativeColumnar),
            _ => None,
        }
    }

    /// Decodes a stored tag.
    ///
    /// # Panics
    /// On a tag outside `0..7`; a corrupted tag means the territory buffers
    /// can no longer be trusted.
    #[inline]
    pub fn from_tag(tag: u64) -> Self {
        match Self::try_from_tag(tag) {
            Some(state) => state,
            None => panic!("invalid territorial state tag {tag}"),
        }
    }

    /// Direction a synapse in this state wants to move, `None` when settled.
    pub const fn migration_shift(self) -> Option<Shift> {
        match self {
            Self::SignalDelivery => None,
            Self::MigrationPositiveX => Some([1, 0, 0]),
            Self::MigrationNegativeX => Some([-1, 0, 0]),
            Self::MigrationPositiveY => Some([0, 1, 0]),
            Self::MigrationNegativeY => Some([0, -1, 0]),
            Self::MigrationPositiveColumnar => Some([0, 0, 1]),
            Self::MigrationNegativeColumnar => Some([0, 0, -1]),
        }
    }

    /// The state a neighbour uses to send synapses back along the same axis.
    pub const fn opposite(self) -> Self {
        match self {
            Self::SignalDelivery => Self::SignalDelivery,
            Self::MigrationPositiveX => Self::MigrationNegativeX,
            Self::MigrationNegativeX => Self::MigrationPositiveX,
            Self::MigrationPositiveY => Self::MigrationNegativeY,
            Self::MigrationNegativeY => Self::MigrationPositiveY,
            Self::MigrationPositiveColumnar => Self::MigrationNegativeColumnar,
            Self::MigrationNegativeColumnar => Self::MigrationPositiveColumnar,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::SignalDelivery => "signal-delivery",
            Self::MigrationPositiveX => "+x",
            Self::MigrationNegativeX => "-x",
            Self::MigrationPositiveY => "+y",
            Self::MigrationNegativeY => "-y",
            Self::MigrationPositiveColumnar => "+c",
            Self::MigrationNegativeColumnar => "-c",
        }
    }
}

impl fmt::Display for TerritorialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TerritorialState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(tag) = trimmed.parse::<u64>() {
            return Self::try_from_tag(tag).ok_or_else(|| format!("invalid state tag {tag}"));
        }
        Self::ALL
            .into_iter()
            .find(|state| state.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown territorial state '{trimmed}'"))
    }
}

/// The six boundary indices of a territory, `d0 ≤ … ≤ d5`.
///
/// List `j` of a territory spans `d[j-1]..d[j]` with `d[-1] = 0` and
/// `d[6] = capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Delimiters(pub [u32; NUM_DELIMITERS]);

impl Delimiters {
    /// Every slot in the signal-delivery list.
    pub const fn settled(capacity: u32) -> Self {
        Self([capacity; NUM_DELIMITERS])
    }

    #[inline]
    pub const fn values(&self) -> [u32; NUM_DELIMITERS] {
        self.0
    }

    pub fn is_valid_for(&self, capacity: u32) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1]) && self.0[NUM_DELIMITERS - 1] <= capacity
    }
}

/// A territory's delimiters paired with its capacity.
///
/// Answers list ranges and sizes per territorial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritorialLists {
    delimiters: Delimiters,
    capacity: u32,
}

impl TerritorialLists {
    /// # Panics
    /// When the delimiters are not monotone or exceed `capacity`.
    pub fn new(delimiters: Delimiters, capacity: u32) -> Self {
        assert!(
            delimiters.is_valid_for(capacity),
            "malformed delimiters {:?} for territory capacity {}",
            delimiters.0,
            capacity
        );
        Self {
            delimiters,
            capacity,
        }
    }

    /// Builds contiguous lists with the given per-state sizes.
    pub fn from_sizes(sizes: [u32; NUM_TERRITORIAL_STATES]) -> Self {
        let mut values = [0u32; NUM_DELIMITERS];
        let mut end = 0u32;
        for (j, size) in sizes.iter().take(NUM_DELIMITERS).enumerate() {
            end += size;
            values[j] = end;
        }
        let capacity = end + sizes[NUM_DELIMITERS];
        Self {
            delimiters: Delimiters(values),
            capacity,
        }
    }

    #[inline]
    pub const fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    #[inline]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn begin(&self, state: TerritorialState) -> u32 {
        match state.index() {
            0 => 0,
            j => self.delimiters.0[j - 1],
        }
    }

    #[inline]
    pub fn end(&self, state: TerritorialState) -> u32 {
        match state.index() {
            NUM_DELIMITERS => self.capacity,
            j => self.delimiters.0[j],
        }
    }

    #[inline]
    pub fn range(&self, state: TerritorialState) -> Range<u32> {
        self.begin(state)..self.end(state)
    }

    #[inline]
    pub fn size(&self, state: TerritorialState) -> u32 {
        self.end(state) - self.begin(state)
    }

    pub fn sizes(&self) -> [u32; NUM_TERRITORIAL_STATES] {
        TerritorialState::ALL.map(|state| self.size(state))
    }

    /// The state whose list contains `slot`.
    ///
    /// # Panics
    /// When `slot` lies outside the territory.
    pub fn state_of_slot(&self, slot: u32) -> TerritorialState {
        assert!(
            slot < self.capacity,
            "slot {slot} outside territory of capacity {}",
            self.capacity
        );
        TerritorialState::ALL
            .into_iter()
            .find(|&state| self.range(state).contains(&slot))
            .unwrap_or(TerritorialState::MigrationNegativeColumnar)
    }
}
