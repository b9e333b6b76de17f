use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Out-degree histograms over a `rows × cols` grid of spatial buckets.
///
/// Each bucket maps an out-degree to the number of cells with that
/// out-degree. The bucket grid resolution is independent of the tissue
/// resolution. Ordered maps keep serialized output stable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutDegreeHistogram {
    rows: u32,
    cols: u32,
    buckets: Vec<BTreeMap<u32, u64>>,
}

impl OutDegreeHistogram {
    /// # Panics
    /// When either dimension is zero.
    pub fn new(rows: u32, cols: u32) -> Self {
        assert!(rows > 0 && cols > 0, "histogram grid must be non-empty");
        Self {
            rows,
            cols,
            buckets: vec![BTreeMap::new(); rows as usize * cols as usize],
        }
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn bucket_index(&self, row: u32, col: u32) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "bucket ({row}, {col}) outside {}x{} histogram",
            self.rows,
            self.cols
        );
        row as usize * self.cols as usize + col as usize
    }

    pub fn bucket(&self, row: u32, col: u32) -> &BTreeMap<u32, u64> {
        &self.buckets[self.bucket_index(row, col)]
    }

    pub fn record(&mut self, row: u32, col: u32, out_degree: u32, occurrences: u64) {
        let idx = self.bucket_index(row, col);
        *self.buckets[idx].entry(out_degree).or_insert(0) += occurrences;
    }

    /// Adds a partial bucket (e.g. one worker's tally) into bucket `index`.
    pub fn merge_bucket(&mut self, index: usize, partial: &BTreeMap<u32, u64>) {
        let bucket = &mut self.buckets[index];
        for (&degree, &count) in partial {
            *bucket.entry(degree).or_insert(0) += count;
        }
    }

    /// Iterates `(row, col, bucket)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &BTreeMap<u32, u64>)> + '_ {
        let cols = self.cols as usize;
        self.buckets
            .iter()
            .enumerate()
            .map(move |(i, b)| ((i / cols) as u32, (i % cols) as u32, b))
    }

    /// Number of cells counted over all buckets.
    pub fn total_cells(&self) -> u64 {
        self.buckets.iter().flat_map(|b| b.values()).sum()
    }

    /// Sum of out-degrees over all counted cells.
    pub fn total_out_degree(&self) -> u64 {
        self.buckets
            .iter()
            .flat_map(|b| b.iter())
            .map(|(&degree, &count)| u64::from(degree) * count)
            .sum()
    }

    /// Histogram of the whole grid collapsed into a single map.
    pub fn collapsed(&self) -> BTreeMap<u32, u64> {
        let mut total = BTreeMap::new();
        for bucket in &self.buckets {
            for (&degree, &count) in bucket {
                *total.entry(degree).or_insert(0) += count;
            }
        }
        total
    }
}
