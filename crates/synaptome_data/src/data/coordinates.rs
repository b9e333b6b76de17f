use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-axis shift `[dx, dy, dc]` relative to a tissue coordinate.
pub type Shift = [i32; 3];

/// Address of a single cell in the tissue.
///
/// `x` and `y` select the column, `c` the position along the columnar axis.
/// Tissue cells occupy the low columnar coordinates of every column, sensory
/// cells the coordinates after them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TissueCoordinates {
    pub x: u32,
    pub y: u32,
    pub c: u32,
}

impl TissueCoordinates {
    #[inline]
    pub const fn new(x: u32, y: u32, c: u32) -> Self {
        Self { x, y, c }
    }

    /// Same column, different columnar coordinate.
    #[inline]
    pub const fn with_columnar(self, c: u32) -> Self {
        Self {
            x: self.x,
            y: self.y,
            c,
        }
    }

    #[inline]
    pub const fn as_array(self) -> [u32; 3] {
        [self.x, self.y, self.c]
    }

    #[inline]
    pub const fn from_array(coords: [u32; 3]) -> Self {
        Self {
            x: coords[0],
            y: coords[1],
            c: coords[2],
        }
    }
}

impl fmt::Display for TissueCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.c)
    }
}

/// Signalling-neighbourhood radii of a cell kind, one per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeighbourhoodRadii {
    pub x: u32,
    pub y: u32,
    pub columnar: u32,
}

impl NeighbourhoodRadii {
    pub const fn new(x: u32, y: u32, columnar: u32) -> Self {
        Self { x, y, columnar }
    }

    pub const fn uniform(radius: u32) -> Self {
        Self::new(radius, radius, radius)
    }

    #[inline]
    pub const fn as_array(self) -> [u32; 3] {
        [self.x, self.y, self.columnar]
    }
}
