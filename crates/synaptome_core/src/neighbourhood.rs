//! Bounded windows of legal shifts around a cell.

use crate::config::StaticConfig;
use crate::shift::{clip_shift, is_inside, shift_coordinates};
use synaptome_data::{NeighbourhoodRadii, Shift, TissueCoordinates};

/// A box of shifts `low..=high` around `center`, with `low <= 0 <= high`
/// on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialNeighbourhood {
    center: TissueCoordinates,
    low: Shift,
    high: Shift,
}

impl SpatialNeighbourhood {
    /// # Panics
    /// When a corner does not bracket the zero shift.
    pub fn new(center: TissueCoordinates, low: Shift, high: Shift) -> Self {
        for axis in 0..3 {
            assert!(
                low[axis] <= 0 && 0 <= high[axis],
                "neighbourhood corners {low:?}..{high:?} do not contain the center"
            );
        }
        Self { center, low, high }
    }

    /// Window of `radii` around `center`. Non-torus axes are clipped so
    /// every shift in the window addresses an existing tissue cell.
    pub fn around(
        config: &StaticConfig,
        center: TissueCoordinates,
        radii: NeighbourhoodRadii,
    ) -> Self {
        let lengths = config.axis_lengths();
        let torus = config.torus_flags();
        let origin = center.as_array();
        let radii = radii.as_array();
        let mut low = [0i32; 3];
        let mut high = [0i32; 3];
        for axis in 0..3 {
            let r = radii[axis] as i32;
            if torus[axis] {
                low[axis] = -r;
                high[axis] = r;
            } else {
                low[axis] = clip_shift(-r, origin[axis], lengths[axis]);
                high[axis] = clip_shift(r, origin[axis], lengths[axis]);
            }
        }
        Self::new(center, low, high)
    }

    #[inline]
    pub fn low(&self) -> Shift {
        self.low
    }

    #[inline]
    pub fn high(&self) -> Shift {
        self.high
    }

    #[inline]
    pub fn contains(&self, shift: Shift) -> bool {
        (0..3).all(|axis| self.low[axis] <= shift[axis] && shift[axis] <= self.high[axis])
    }

    /// Coordinates of the cell at `shift` from the center.
    ///
    /// # Panics
    /// When `shift` lies outside the window or resolves to no cell.
    pub fn resolve(&self, config: &StaticConfig, shift: Shift) -> TissueCoordinates {
        assert!(
            self.contains(shift),
            "shift {shift:?} outside neighbourhood {:?}..{:?} of {}",
            self.low,
            self.high,
            self.center
        );
        let lengths = config.axis_lengths();
        let target = shift_coordinates(self.center, shift, lengths, config.torus_flags());
        assert!(
            is_inside(target, lengths),
            "shift {shift:?} from {} leaves the tissue",
            self.center
        );
        target
    }

    /// Every shift in the window, columnar innermost.
    pub fn shifts(&self) -> impl Iterator<Item = Shift> + '_ {
        let (low, high) = (self.low, self.high);
        (low[1]..=high[1]).flat_map(move |dy| {
            (low[0]..=high[0]).flat_map(move |dx| (low[2]..=high[2]).map(move |dc| [dx, dy, dc]))
        })
    }

    /// Number of shifts in the window.
    pub fn len(&self) -> usize {
        (0..3)
            .map(|axis| (self.high[axis] - self.low[axis] + 1) as usize)
            .product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
