//! Reproducible random initialization of a tissue.

use crate::bits::low_mask;
use crate::fill::{fill_delimiters, FillPolicy};
use crate::tissue::DynamicState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use synaptome_data::{TerritorialState, TissueCoordinates, NUM_TERRITORIAL_STATES};

/// Fills every record, source and tag of `state` from a ChaCha8 stream
/// seeded with `seed`, then regroups every territory by its tags.
///
/// Equal seeds on equal configs give equal fingerprints.
pub fn seed_tissue(state: &mut DynamicState, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let config = state.config().clone();
    let bits = config.bits();
    let (size_x, size_y) = (config.size_x(), config.size_y());
    let total = config.total_columnar_length();
    let tissue = config.num_tissue_cells_per_column();

    let random_source = |rng: &mut ChaCha8Rng| {
        TissueCoordinates::new(
            rng.gen_range(0..size_x),
            rng.gen_range(0..size_y),
            rng.gen_range(0..total),
        )
    };

    for column in 0..config.num_columns() {
        let (x, y) = config.column_coordinates(column);
        for c in 0..total {
            let coords = TissueCoordinates::new(x, y, c);
            if c >= tissue {
                state.set_sensor(coords, rng.gen::<u64>() & low_mask(bits.sensory));
                continue;
            }
            state.set_cell(coords, rng.gen::<u64>() & low_mask(bits.cell));
            state.set_signalling(coords, rng.gen::<u64>() & low_mask(bits.signalling));
            for slot in 0..state.capacity_of(coords) {
                state.set_synapse(coords, slot, rng.gen::<u64>() & low_mask(bits.synapse));
                let source = random_source(&mut rng);
                state.set_synapse_source(coords, slot, source);
                let tag = rng.gen_range(0..NUM_TERRITORIAL_STATES as u64);
                state.set_territorial_state(coords, slot, TerritorialState::from_tag(tag));
            }
        }
    }

    for index in 0..state.num_muscle_synapses() {
        state.set_muscle_synapse(index, rng.gen::<u64>() & low_mask(bits.synapse_to_muscle));
        let source = random_source(&mut rng);
        state.set_muscle_source(index, source);
    }

    for kind in 0..config.num_tissue_kinds() {
        fill_delimiters(state, kind, FillPolicy::FromTerritorialStates);
    }
    tracing::debug!(seed, "Tissue seeded");
}
