//! Stride-based partition cursors.
//!
//! Worker `k` of `N` starts at position `k` of the space and advances by `N`
//! positions at a time, innermost axis first, with carry into the outer
//! axes. The `N` resulting subsets are disjoint and together cover the whole
//! space exactly once, so no locking is needed to split work.
//!
//! Axis order follows the memory layout: `x` is innermost for columns; for
//! cells the columnar coordinate is innermost, then `x`, then `y`.

use synaptome_data::TissueCoordinates;

/// Advances a flat index by `extent`. Returns `true` when the advance ran
/// past the end of `0..size`.
#[inline]
pub fn advance_index(index: &mut usize, extent: usize, size: usize) -> bool {
    *index += extent;
    if *index >= size {
        *index %= size.max(1);
        true
    } else {
        false
    }
}

/// Advances a column `(x, y)` by `extent` columns. Returns `true` when the
/// advance wrapped past the last column.
#[inline]
pub fn advance_column(x: &mut u32, y: &mut u32, extent: u32, size_x: u32, size_y: u32) -> bool {
    let nx = u64::from(*x) + u64::from(extent);
    let carry = nx / u64::from(size_x);
    *x = (nx % u64::from(size_x)) as u32;
    let ny = u64::from(*y) + carry;
    *y = (ny % u64::from(size_y)) as u32;
    ny >= u64::from(size_y)
}

/// Advances a cell `(x, y, c)` by `extent` cells. Returns `true` when the
/// advance wrapped past the last cell.
#[inline]
pub fn advance_cell(
    x: &mut u32,
    y: &mut u32,
    c: &mut u32,
    extent: u32,
    size_x: u32,
    size_y: u32,
    size_c: u32,
) -> bool {
    let nc = u64::from(*c) + u64::from(extent);
    let carry = nc / u64::from(size_c);
    *c = (nc % u64::from(size_c)) as u32;
    let nx = u64::from(*x) + carry;
    let carry = nx / u64::from(size_x);
    *x = (nx % u64::from(size_x)) as u32;
    let ny = u64::from(*y) + carry;
    *y = (ny % u64::from(size_y)) as u32;
    ny >= u64::from(size_y)
}

/// Columns `(x, y)` visited by one worker.
#[derive(Debug, Clone)]
pub struct ColumnPartition {
    x: u32,
    y: u32,
    extent: u32,
    size_x: u32,
    size_y: u32,
    done: bool,
}

impl ColumnPartition {
    /// # Panics
    /// When `workers` is zero or `worker >= workers`.
    pub fn new(worker: usize, workers: usize, size_x: u32, size_y: u32) -> Self {
        assert!(
            workers > 0 && worker < workers,
            "worker {worker} outside pool of {workers}"
        );
        let mut cursor = Self {
            x: 0,
            y: 0,
            extent: workers as u32,
            size_x,
            size_y,
            done: size_x == 0 || size_y == 0,
        };
        if !cursor.done && worker > 0 {
            cursor.done = advance_column(
                &mut cursor.x,
                &mut cursor.y,
                worker as u32,
                size_x,
                size_y,
            );
        }
        cursor
    }
}

impl Iterator for ColumnPartition {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = (self.x, self.y);
        self.done = advance_column(
            &mut self.x,
            &mut self.y,
            self.extent,
            self.size_x,
            self.size_y,
        );
        Some(current)
    }
}

/// Cells `(x, y, c)` visited by one worker, `c` in `0..size_c`.
#[derive(Debug, Clone)]
pub struct CellPartition {
    coords: TissueCoordinates,
    extent: u32,
    sizes: [u32; 3],
    done: bool,
}

impl CellPartition {
    /// # Panics
    /// When `workers` is zero or `worker >= workers`.
    pub fn new(worker: usize, workers: usize, size_x: u32, size_y: u32, size_c: u32) -> Self {
        assert!(
            workers > 0 && worker < workers,
            "worker {worker} outside pool of {workers}"
        );
        let mut cursor = Self {
            coords: TissueCoordinates::default(),
            extent: workers as u32,
            sizes: [size_x, size_y, size_c],
            done: size_x == 0 || size_y == 0 || size_c == 0,
        };
        if !cursor.done && worker > 0 {
            cursor.done = cursor.step(worker as u32);
        }
        cursor
    }

    #[inline]
    fn step(&mut self, extent: u32) -> bool {
        let TissueCoordinates { x, y, c } = &mut self.coords;
        advance_cell(
            x,
            y,
            c,
            extent,
            self.sizes[0],
            self.sizes[1],
            self.sizes[2],
        )
    }
}

impl Iterator for CellPartition {
    type Item = TissueCoordinates;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.coords;
        self.done = self.step(self.extent);
        Some(current)
    }
}

/// Flat indices in `0..size` visited by one worker.
#[derive(Debug, Clone)]
pub struct IndexPartition {
    index: usize,
    extent: usize,
    size: usize,
    done: bool,
}

impl IndexPartition {
    /// # Panics
    /// When `workers` is zero or `worker >= workers`.
    pub fn new(worker: usize, workers: usize, size: usize) -> Self {
        assert!(
            workers > 0 && worker < workers,
            "worker {worker} outside pool of {workers}"
        );
        let mut cursor = Self {
            index: 0,
            extent: workers,
            size,
            done: size == 0,
        };
        if !cursor.done && worker > 0 {
            cursor.done = advance_index(&mut cursor.index, worker, size);
        }
        cursor
    }
}

impl Iterator for IndexPartition {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.index;
        self.done = advance_index(&mut self.index, self.extent, self.size);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_advance_column_carries_into_y() {
        let (mut x, mut y) = (3, 0);
        assert!(!advance_column(&mut x, &mut y, 2, 4, 3));
        assert_eq!((x, y), (1, 1));
        assert!(advance_column(&mut x, &mut y, 8, 4, 3));
    }

    #[test]
    fn test_advance_cell_carries_through_all_axes() {
        let (mut x, mut y, mut c) = (1, 0, 2);
        assert!(!advance_cell(&mut x, &mut y, &mut c, 1, 2, 2, 3));
        assert_eq!((x, y, c), (0, 1, 0));
        assert!(advance_cell(&mut x, &mut y, &mut c, 6, 2, 2, 3));
    }

    #[test]
    fn test_columns_cover_grid_once() {
        let (sx, sy) = (5, 3);
        for workers in 1..=20 {
            let mut seen = HashSet::new();
            for worker in 0..workers {
                for column in ColumnPartition::new(worker, workers, sx, sy) {
                    assert!(seen.insert(column), "{column:?} visited twice");
                }
            }
            assert_eq!(seen.len(), (sx * sy) as usize, "workers = {workers}");
        }
    }

    #[test]
    fn test_cells_cover_space_once() {
        for workers in [1, 2, 3, 7, 31, 64] {
            let mut seen = HashSet::new();
            for worker in 0..workers {
                seen.extend(CellPartition::new(worker, workers, 3, 2, 4));
            }
            assert_eq!(seen.len(), 24);
        }
    }

    #[test]
    fn test_worker_beyond_space_gets_nothing() {
        assert_eq!(ColumnPartition::new(5, 8, 2, 2).count(), 0);
        assert_eq!(IndexPartition::new(3, 4, 3).count(), 0);
    }

    #[test]
    fn test_index_partition_strides() {
        let got: Vec<usize> = IndexPartition::new(1, 3, 10).collect();
        assert_eq!(got, vec![1, 4, 7]);
        assert_eq!(IndexPartition::new(0, 1, 0).count(), 0);
    }

    #[test]
    #[should_panic(expected = "outside pool")]
    fn test_zero_workers_rejected() {
        ColumnPartition::new(0, 0, 4, 4);
    }
}
