mod common;

use common::{Call, Recorder, TagByRecord, TissueBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use synaptome_core::{
    compute_out_degrees, CellContext, MuscleSynapseContext, SignallingContext, SynapseContext,
    SynapseUpdate, TransitionEngine, TransitionFunctions,
};
use synaptome_data::{TerritorialState, TissueCoordinates};
use synaptome_lib::{DemoRules, DynamicState, RuleParams};

use TerritorialState::{MigrationNegativeX as NegX, SignalDelivery as Sd};

/// Every synapse of the tissue as `(record, source)`, sorted.
fn synapse_multiset(state: &DynamicState) -> Vec<(u64, TissueCoordinates)> {
    let config = state.config().clone();
    let mut all = Vec::new();
    for column in 0..config.num_columns() {
        let (x, y) = config.column_coordinates(column);
        for c in 0..config.num_tissue_cells_per_column() {
            for synapse in state.territory(TissueCoordinates::new(x, y, c)) {
                all.push((synapse.record, synapse.source));
            }
        }
    }
    all.sort();
    all
}

#[test]
fn test_phases_run_in_order() {
    let mut state = TissueBuilder::new(3, 2)
        .with_kind(2, 4)
        .with_sensors(1)
        .with_muscles(5)
        .with_seed(11)
        .build();
    let mut engine = TransitionEngine::new(Recorder::default(), 3).unwrap();

    engine.run_rounds(&mut state, 2);

    let calls = engine.functions().calls();
    let per_round = 5 + 3 * 2 * 2 * 4 + 3 * 2 * 2 + 3 * 2 * 2;
    assert_eq!(calls.len(), 2 * per_round);
    assert!(
        calls
            .windows(2)
            .all(|w| (w[0].time_step(), w[0].rank()) <= (w[1].time_step(), w[1].rank())),
        "A phase started before the previous one finished"
    );
    assert_eq!(
        calls.iter().filter(|c| matches!(c, Call::Synapse(1))).count(),
        48
    );
    assert_eq!(engine.time_step(), 2);
    assert_eq!(engine.metrics().rounds(), 2);
}

#[test]
fn test_migration_exchanges_matching_lists() {
    let mut state = TissueBuilder::new(3, 1)
        .with_kind(1, 4)
        .with_torus(false, false, false)
        .build();
    let a = TissueCoordinates::new(0, 0, 0);
    let b = TissueCoordinates::new(1, 0, 0);
    let c = TissueCoordinates::new(2, 0, 0);
    // Low three bits pick the tag: 1 is +x, 2 is -x, 0 settles.
    for (coords, records) in [
        (a, [9, 17, 24, 34]),
        (b, [42, 48, 58, 65]),
        (c, [72, 80, 88, 96]),
    ] {
        for (slot, record) in records.into_iter().enumerate() {
            state.set_synapse(coords, slot as u32, record);
        }
    }

    let mut engine = TransitionEngine::new(TagByRecord, 2).unwrap();
    engine.run_round(&mut state);

    let records = |coords| (0..4).map(|s| state.synapse(coords, s)).collect::<Vec<_>>();
    let tags = |coords| {
        (0..4)
            .map(|s| state.territorial_state(coords, s))
            .collect::<Vec<_>>()
    };

    // A sent both +x synapses to B and took both of B's -x synapses.
    assert_eq!(records(a), vec![24, 42, 58, 34]);
    assert_eq!(tags(a), vec![Sd, Sd, Sd, NegX]);
    assert_list_sizes!(state, a, [3, 0, 1, 0, 0, 0, 0]);

    // C has nothing heading to B, so B keeps its +x synapse.
    assert_eq!(records(b), vec![48, 9, 17, 65]);
    assert_list_sizes!(state, b, [3, 1, 0, 0, 0, 0, 0]);

    assert_eq!(records(c), vec![72, 80, 88, 96]);
    assert_list_sizes!(state, c, [4, 0, 0, 0, 0, 0, 0]);
    assert_territories_consistent!(state);
}

#[test]
fn test_migration_conserves_synapses() {
    let mut state = TissueBuilder::new(4, 3)
        .with_kind(2, 6)
        .with_kind(1, 5)
        .with_sensors(1)
        .with_torus(true, false, true)
        .with_seed(5)
        .build();
    let before = synapse_multiset(&state);

    let mut engine = TransitionEngine::new(TagByRecord, 4).unwrap();
    for _ in 0..4 {
        engine.run_round(&mut state);
        assert_territories_consistent!(state);
        for column in 0..state.config().num_columns() {
            let (x, y) = state.config().column_coordinates(column);
            for c in 0..3 {
                let coords = TissueCoordinates::new(x, y, c);
                let sizes = state.territorial_lists(coords).sizes();
                assert_eq!(sizes.iter().sum::<u32>(), state.capacity_of(coords));
            }
        }
    }

    assert_eq!(synapse_multiset(&state), before);
}

#[test]
fn test_random_traffic_on_small_torus_conserves_synapses() {
    // Length-2 axes make both neighbours along an axis the same cell.
    let mut state = TissueBuilder::new(2, 2)
        .with_kind(2, 12)
        .with_torus(true, true, true)
        .build();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for column in 0..4 {
        let (x, y) = state.config().column_coordinates(column);
        for c in 0..2 {
            let coords = TissueCoordinates::new(x, y, c);
            for slot in 0..12 {
                state.set_synapse(coords, slot, rng.gen_range(0..1u64 << 16));
                let source = TissueCoordinates::new(rng.gen_range(0..2), rng.gen_range(0..2), c);
                state.set_synapse_source(coords, slot, source);
            }
        }
    }
    let before = synapse_multiset(&state);

    let mut engine = TransitionEngine::new(TagByRecord, 3).unwrap();
    engine.run_rounds(&mut state, 5);

    assert_eq!(synapse_multiset(&state), before);
    assert_territories_consistent!(state);
}

#[test]
fn test_single_cell_torus_keeps_its_synapses() {
    let mut state = TissueBuilder::new(1, 1)
        .with_kind(1, 8)
        .with_torus(true, true, true)
        .with_seed(9)
        .build();
    let before = synapse_multiset(&state);
    let mut engine = TransitionEngine::new(TagByRecord, 1).unwrap();
    engine.run_rounds(&mut state, 3);
    assert_eq!(synapse_multiset(&state), before);
    assert_territories_consistent!(state);
}

#[test]
fn test_rounds_are_independent_of_worker_count() {
    let builder = || {
        TissueBuilder::new(7, 5)
            .with_kind(3, 9)
            .with_kind(1, 4)
            .with_sensors(2)
            .with_muscles(13)
            .with_seed(2024)
    };
    let fingerprints: Vec<String> = [1, 2, 5]
        .into_iter()
        .map(|threads| {
            let mut state = builder().build();
            let rules = DemoRules::new(state.config(), RuleParams::default()).unwrap();
            let mut engine = TransitionEngine::new(rules, threads).unwrap();
            engine.run_rounds(&mut state, 6);
            state.fingerprint()
        })
        .collect();

    assert_eq!(fingerprints[0], fingerprints[1]);
    assert_eq!(fingerprints[0], fingerprints[2]);
}

#[test]
fn test_rounds_change_the_tissue() {
    let mut state = TissueBuilder::new(4, 4).with_kind(2, 8).with_seed(3).build();
    let initial = state.fingerprint();
    let rules = DemoRules::new(state.config(), RuleParams::default()).unwrap();
    let mut engine = TransitionEngine::new(rules, 2).unwrap();
    engine.run_round(&mut state);
    assert_ne!(state.fingerprint(), initial);
}

#[test]
#[should_panic(expected = "holds scratch counters")]
fn test_round_refused_while_analysis_pending() {
    let mut state = TissueBuilder::new(2, 2).with_kind(1, 3).with_seed(1).build();
    compute_out_degrees(&mut state, 0, TerritorialState::SignalDelivery, 1, 1, 1).unwrap();
    let mut engine = TransitionEngine::new(TagByRecord, 1).unwrap();
    engine.run_round(&mut state);
}

struct Overflowing;

impl TransitionFunctions for Overflowing {
    fn synapse_to_muscle(&self, ctx: &MuscleSynapseContext<'_>) -> u64 {
        ctx.record()
    }

    fn synapse_in_tissue(&self, ctx: &SynapseContext<'_>) -> SynapseUpdate {
        SynapseUpdate::settled(ctx.record())
    }

    fn signalling(&self, ctx: &SignallingContext<'_>) -> u64 {
        ctx.record()
    }

    fn cell(&self, _ctx: &CellContext<'_>) -> u64 {
        u64::MAX
    }
}

#[test]
#[should_panic(expected = "does not fit")]
fn test_oversized_cell_record_panics() {
    let mut state = TissueBuilder::new(2, 2).with_kind(1, 2).build();
    let mut engine = TransitionEngine::new(Overflowing, 2).unwrap();
    engine.run_round(&mut state);
}

#[test]
#[should_panic(expected = "at least one worker")]
fn test_zero_workers_rejected() {
    let _ = TransitionEngine::new(TagByRecord, 0);
}
