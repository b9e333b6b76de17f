use super::context::{
    CellContext, MuscleSynapseContext, SignallingContext, SynapseContext, TransitionFunctions,
};
use crate::cursor::{CellPartition, ColumnPartition, IndexPartition};
use crate::neighbourhood::SpatialNeighbourhood;
use crate::pool::WorkerPool;
use crate::shift::{is_inside, shift_coordinates};
use crate::tissue::DynamicState;
use synaptome_data::{
    TerritorialLists, TerritorialState, TissueCoordinates, NUM_DELIMITERS, NUM_TERRITORIAL_STATES,
};

pub(super) fn synapses_to_muscles<T: TransitionFunctions>(
    pool: &WorkerPool,
    functions: &T,
    state: &DynamicState,
    time_step: u64,
) {
    let size = state.num_muscle_synapses();
    pool.run(|worker, workers| {
        for index in IndexPartition::new(worker, workers, size) {
            let record = functions.synapse_to_muscle(&MuscleSynapseContext {
                state,
                index,
                time_step,
            });
            state.set_muscle_synapse(index, record);
        }
    });
}

pub(super) fn synapses_in_tissue<T: TransitionFunctions>(
    pool: &WorkerPool,
    functions: &T,
    state: &DynamicState,
    time_step: u64,
) {
    let config = state.config();
    let per_column = config.num_tissue_cells_per_column();
    pool.run(|worker, workers| {
        for (x, y) in ColumnPartition::new(worker, workers, config.size_x(), config.size_y()) {
            for c in 0..per_column {
                let coords = TissueCoordinates::new(x, y, c);
                let kind = config.kind_of(c);
                let neighbourhood =
                    SpatialNeighbourhood::around(config, coords, config.synapse_radius(kind));
                for slot in 0..config.territory_capacity(kind) {
                    let update = functions.synapse_in_tissue(&SynapseContext {
                        state,
                        coords,
                        slot,
                        neighbourhood,
                        time_step,
                    });
                    state.set_synapse(coords, slot, update.record);
                    state.set_territorial_state(coords, slot, update.territorial_state);
                }
            }
        }
    });
}

/// Regroups every territory by tag into the back buffers and swaps them in.
pub(super) fn redistribute(pool: &WorkerPool, state: &mut DynamicState) {
    {
        let state = &*state;
        let config = state.config();
        let per_column = config.num_tissue_cells_per_column();
        pool.run(|worker, workers| {
            for (x, y) in ColumnPartition::new(worker, workers, config.size_x(), config.size_y()) {
                for c in 0..per_column {
                    let coords = TissueCoordinates::new(x, y, c);
                    let delimiters = state.regroup_into_back(coords);
                    state
                        .back()
                        .set_delimiters(state.cell_slot(coords), &delimiters);
                }
            }
        });
    }
    state.swap_territories();

    if cfg!(debug_assertions) {
        if let Err(violation) = state.check_all_territories() {
            panic!("redistribution left an inconsistent territory: {violation}");
        }
    }
}

/// Neighbour, its lists and the number of synapses swapped with it.
type Exchange = Option<(TissueCoordinates, TerritorialLists, u32)>;

/// Exchanges synapses between neighbouring cells along every migration
/// direction and swaps the result in.
pub(super) fn migrate(pool: &WorkerPool, state: &mut DynamicState) {
    {
        let state = &*state;
        let config = state.config();
        let per_column = config.num_tissue_cells_per_column();
        pool.run(|worker, workers| {
            for (x, y) in ColumnPartition::new(worker, workers, config.size_x(), config.size_y()) {
                for c in 0..per_column {
                    migrate_cell(state, TissueCoordinates::new(x, y, c));
                }
            }
        });
    }
    state.swap_territories();
}

/// Builds the post-migration territory of `coords` in the back buffers.
///
/// For direction `m` with neighbour `N`, the first
/// `k = min(|C.m|, |N.opposite(m)|)` synapses of each list change owner.
/// Received synapses are appended to the signal-delivery list in direction
/// order; everything else stays in its list.
fn migrate_cell(state: &DynamicState, coords: TissueCoordinates) {
    let config = state.config();
    let lengths = config.axis_lengths();
    let torus = config.torus_flags();
    let own = state.territorial_lists(coords);

    let mut exchanges: [Exchange; NUM_DELIMITERS] = [None; NUM_DELIMITERS];
    for (exchange, m) in exchanges.iter_mut().zip(TerritorialState::MIGRATIONS) {
        let Some(shift) = m.migration_shift() else {
            continue;
        };
        let neighbour = shift_coordinates(coords, shift, lengths, torus);
        if !is_inside(neighbour, lengths) {
            continue;
        }
        let theirs = state.territorial_lists(neighbour);
        let k = own.size(m).min(theirs.size(m.opposite()));
        *exchange = Some((neighbour, theirs, k));
    }

    let mut next = 0u32;
    let mut copy = |from: TissueCoordinates, slot: u32, tag: TerritorialState| {
        let dst = state.slot_index(coords, next);
        let src = state.slot_index(from, slot);
        state.back().copy_from(dst, state.front(), src, tag);
        next += 1;
    };

    for slot in own.range(TerritorialState::SignalDelivery) {
        copy(coords, slot, TerritorialState::SignalDelivery);
    }
    for (exchange, m) in exchanges.iter().copied().zip(TerritorialState::MIGRATIONS) {
        if let Some((neighbour, theirs, k)) = exchange {
            let begin = theirs.begin(m.opposite());
            for slot in begin..begin + k {
                copy(neighbour, slot, TerritorialState::SignalDelivery);
            }
        }
    }

    let mut sizes = [0u32; NUM_TERRITORIAL_STATES];
    for (exchange, m) in exchanges.iter().copied().zip(TerritorialState::MIGRATIONS) {
        let k = exchange.map_or(0, |(_, _, k)| k);
        let kept = own.range(m);
        for slot in kept.start + k..kept.end {
            copy(coords, slot, m);
        }
        sizes[m.index()] = own.size(m) - k;
    }
    sizes[TerritorialState::SignalDelivery.index()] = own.capacity() - sizes.iter().sum::<u32>();

    let lists = TerritorialLists::from_sizes(sizes);
    state
        .back()
        .set_delimiters(state.cell_slot(coords), &lists.delimiters());
}

pub(super) fn signalling<T: TransitionFunctions>(
    pool: &WorkerPool,
    functions: &T,
    state: &DynamicState,
    time_step: u64,
) {
    let config = state.config();
    pool.run(|worker, workers| {
        for coords in CellPartition::new(
            worker,
            workers,
            config.size_x(),
            config.size_y(),
            config.num_tissue_cells_per_column(),
        ) {
            let kind = config.kind_of(coords.c);
            let record = functions.signalling(&SignallingContext {
                state,
                coords,
                neighbourhood: SpatialNeighbourhood::around(
                    config,
                    coords,
                    config.cell_radius(kind),
                ),
                time_step,
            });
            state.set_signalling(coords, record);
        }
    });
}

pub(super) fn cells<T: TransitionFunctions>(
    pool: &WorkerPool,
    functions: &T,
    state: &DynamicState,
    time_step: u64,
) {
    let config = state.config();
    pool.run(|worker, workers| {
        for coords in CellPartition::new(
            worker,
            workers,
            config.size_x(),
            config.size_y(),
            config.num_tissue_cells_per_column(),
        ) {
            let record = functions.cell(&CellContext {
                state,
                coords,
                time_step,
            });
            state.set_cell(coords, record);
        }
    });
}
