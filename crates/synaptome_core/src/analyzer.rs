//! Connectivity analysis over a tissue.
//!
//! [`compute_out_degrees`] counts, for every cell of one kind, how many
//! synapses in the whole tissue it is the source of, and buckets the counts
//! spatially. The counters are kept in the delimiter words of the analysed
//! kind, which is left in [`DelimiterMode::ScratchCounters`] afterwards;
//! [`fill_delimiters`](crate::fill::fill_delimiters) hands it back to rounds.

use crate::cursor::ColumnPartition;
use crate::error::Result;
use crate::pool::WorkerPool;
use crate::tissue::{DelimiterMode, DynamicState};
use rayon::prelude::*;
use std::sync::Mutex;
use std::time::Instant;
use synaptome_data::{
    OutDegreeHistogram, TerritorialState, TissueCoordinates, NUM_TERRITORIAL_STATES,
};

/// Builds a pool of `num_threads` workers and runs
/// [`compute_out_degrees_with`] on it.
pub fn compute_out_degrees(
    state: &mut DynamicState,
    kind: u32,
    filter: TerritorialState,
    rows: u32,
    cols: u32,
    num_threads: usize,
) -> Result<OutDegreeHistogram> {
    let pool = WorkerPool::new(num_threads)?;
    Ok(compute_out_degrees_with(&pool, state, kind, filter, rows, cols))
}

/// Out-degree histogram of the cells of `kind`, counting only synapses
/// tagged `filter`, over a `rows x cols` grid of spatial buckets.
///
/// Three strictly ordered passes: clear the counters, accumulate one count
/// per matching synapse into its source's counter, reduce the counters into
/// the buckets. The result does not depend on the number of workers.
///
/// # Panics
/// When `rows` or `cols` is zero, `kind` is not a tissue kind, or a counter
/// would overflow 32 bits.
pub fn compute_out_degrees_with(
    pool: &WorkerPool,
    state: &mut DynamicState,
    kind: u32,
    filter: TerritorialState,
    rows: u32,
    cols: u32,
) -> OutDegreeHistogram {
    assert!(rows > 0 && cols > 0, "histogram needs at least one bucket");
    let config = state.config().clone();
    assert!(
        config.is_tissue_kind(kind),
        "kind {kind} is not a tissue cell kind"
    );
    let started = Instant::now();
    state.set_delimiter_mode(kind, DelimiterMode::ScratchCounters);
    let state = &*state;

    let (size_x, size_y) = (config.size_x(), config.size_y());
    let range = config.kind_range(kind);
    let per_column = config.num_tissue_cells_per_column();

    pool.run(|worker, workers| {
        for (x, y) in ColumnPartition::new(worker, workers, size_x, size_y) {
            for c in range.clone() {
                state.set_scratch_counter(TissueCoordinates::new(x, y, c), 0);
            }
        }
    });

    // Counters of one source are bumped from many territories.
    let counters = Mutex::new(());
    pool.run(|worker, workers| {
        for (x, y) in ColumnPartition::new(worker, workers, size_x, size_y) {
            for c in 0..per_column {
                let coords = TissueCoordinates::new(x, y, c);
                for synapse in state.territory(coords) {
                    let source = synapse.source;
                    if synapse.territorial_state != filter
                        || !config.is_tissue(source.c)
                        || config.kind_of(source.c) != kind
                    {
                        continue;
                    }
                    let _guard = counters.lock().unwrap_or_else(|e| e.into_inner());
                    let count = state.scratch_counter(source);
                    assert!(count < u32::MAX, "out-degree counter of {source} overflowed");
                    state.set_scratch_counter(source, count + 1);
                }
            }
        }
    });

    let histogram = Mutex::new(OutDegreeHistogram::new(rows, cols));
    pool.run(|worker, workers| {
        let mut partial = OutDegreeHistogram::new(rows, cols);
        for (x, y) in ColumnPartition::new(worker, workers, size_x, size_y) {
            let row = (u64::from(y) * u64::from(rows) / u64::from(size_y)) as u32;
            let col = (u64::from(x) * u64::from(cols) / u64::from(size_x)) as u32;
            for c in range.clone() {
                let degree = state.scratch_counter(TissueCoordinates::new(x, y, c));
                partial.record(row, col, degree, 1);
            }
        }
        let mut histogram = histogram.lock().unwrap_or_else(|e| e.into_inner());
        for (row, col, counts) in partial.iter() {
            let bucket = histogram.bucket_index(row, col);
            histogram.merge_bucket(bucket, counts);
        }
    });

    let histogram = histogram.into_inner().unwrap_or_else(|e| e.into_inner());
    tracing::debug!(
        kind,
        %filter,
        rows,
        cols,
        cells = histogram.total_cells(),
        duration_us = started.elapsed().as_micros() as u64,
        "Out-degree histogram computed"
    );
    histogram
}

/// Total size of every territorial list over all cells of `kind`.
///
/// # Panics
/// When `kind` is holding scratch counters.
pub fn territorial_statistics(state: &DynamicState, kind: u32) -> [u64; NUM_TERRITORIAL_STATES] {
    let config = state.config();
    let range = config.kind_range(kind);
    (0..config.num_columns())
        .into_par_iter()
        .map(|column| {
            let (x, y) = config.column_coordinates(column);
            let mut totals = [0u64; NUM_TERRITORIAL_STATES];
            for c in range.clone() {
                let lists = state.territorial_lists(TissueCoordinates::new(x, y, c));
                for (total, size) in totals.iter_mut().zip(lists.sizes()) {
                    *total += u64::from(size);
                }
            }
            totals
        })
        .reduce(
            || [0u64; NUM_TERRITORIAL_STATES],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CellKindConfig, SensoryKindConfig, StaticConfig, TissueConfig};
    use crate::fill::{fill_delimiters, FillPolicy};
    use std::sync::Arc;
    use synaptome_data::NeighbourhoodRadii;

    fn state() -> DynamicState {
        let config = TissueConfig {
            size_x: 4,
            size_y: 2,
            cell_kinds: vec![
                CellKindConfig {
                    cells_per_column: 1,
                    territory_capacity: 3,
                    cell_radius: NeighbourhoodRadii::uniform(1),
                    synapse_radius: NeighbourhoodRadii::uniform(1),
                },
                CellKindConfig {
                    cells_per_column: 1,
                    territory_capacity: 2,
                    cell_radius: NeighbourhoodRadii::uniform(1),
                    synapse_radius: NeighbourhoodRadii::uniform(1),
                },
            ],
            sensory_kinds: vec![SensoryKindConfig {
                cells_per_column: 1,
            }],
            ..Default::default()
        };
        DynamicState::new(Arc::new(StaticConfig::new(config).unwrap()))
    }

    #[test]
    fn test_every_synapse_from_origin() {
        let mut s = state();
        // All sources default to (0, 0, 0), a kind-0 cell.
        let h = compute_out_degrees(&mut s, 0, TerritorialState::SignalDelivery, 1, 1, 2).unwrap();
        let bucket = h.bucket(0, 0);
        // 8 columns x (3 + 2) slots point at (0, 0, 0).
        assert_eq!(bucket.get(&40), Some(&1));
        assert_eq!(bucket.get(&0), Some(&7));
        assert_eq!(h.total_out_degree(), 40);
        assert_eq!(s.delimiter_mode(0), DelimiterMode::ScratchCounters);
        assert_eq!(s.delimiter_mode(1), DelimiterMode::Delimiters);
    }

    #[test]
    fn test_sources_of_other_kinds_are_ignored() {
        let mut s = state();
        let sensor = TissueCoordinates::new(1, 1, 2);
        let kind1 = TissueCoordinates::new(2, 0, 1);
        for x in 0..4 {
            for y in 0..2 {
                let coords = TissueCoordinates::new(x, y, 0);
                s.set_synapse_source(coords, 0, sensor);
                s.set_synapse_source(coords, 1, kind1);
                s.set_synapse_source(coords, 2, kind1);
                let other = coords.with_columnar(1);
                s.set_synapse_source(other, 0, sensor);
                s.set_synapse_source(other, 1, sensor);
            }
        }
        let h = compute_out_degrees(&mut s, 0, TerritorialState::SignalDelivery, 2, 2, 3).unwrap();
        assert_eq!(h.total_out_degree(), 0);
        assert_eq!(h.total_cells(), 8);

        fill_delimiters(&mut s, 0, FillPolicy::FromTerritorialStates);
        let h = compute_out_degrees(&mut s, 1, TerritorialState::SignalDelivery, 1, 1, 1).unwrap();
        assert_eq!(h.total_out_degree(), 16);
        assert_eq!(h.bucket(0, 0).get(&16), Some(&1));
    }

    #[test]
    fn test_filter_excludes_other_tags() {
        let mut s = state();
        let h = compute_out_degrees(&mut s, 0, TerritorialState::MigrationPositiveX, 1, 1, 1)
            .unwrap();
        assert_eq!(h.total_out_degree(), 0);
    }

    #[test]
    fn test_buckets_split_grid() {
        let mut s = state();
        let h = compute_out_degrees(&mut s, 1, TerritorialState::SignalDelivery, 2, 4, 2).unwrap();
        for (_, _, bucket) in h.iter() {
            assert_eq!(bucket.values().sum::<u64>(), 1);
        }
    }

    #[test]
    fn test_territorial_statistics() {
        let mut s = state();
        assert_eq!(territorial_statistics(&s, 0), [24, 0, 0, 0, 0, 0, 0]);
        fill_delimiters(&mut s, 1, FillPolicy::Regular);
        assert_eq!(territorial_statistics(&s, 1), [8, 8, 0, 0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "at least one bucket")]
    fn test_zero_rows_rejected() {
        let mut s = state();
        let _ = compute_out_degrees(&mut s, 0, TerritorialState::SignalDelivery, 0, 1, 1);
    }
}
