use proptest::prelude::*;
use std::sync::Arc;
use synaptome_core::shift::{clip_shift, is_inside, shift_coordinate, shift_coordinates};
use synaptome_core::{CellKindConfig, SpatialNeighbourhood, StaticConfig, TissueConfig, TorusConfig};
use synaptome_data::{NeighbourhoodRadii, TissueCoordinates};

prop_compose! {
    fn arb_axis()(length in 1u32..64)(
        length in Just(length),
        coord in 0..length,
        shift in -(length as i32)..=(length as i32)
    ) -> (u32, u32, i32) {
        (length, coord, shift)
    }
}

prop_compose! {
    fn arb_tissue()(
        size_x in 1u32..9,
        size_y in 1u32..9,
        cells in 1u32..4,
        torus in any::<(bool, bool, bool)>()
    )(
        size_x in Just(size_x),
        size_y in Just(size_y),
        cells in Just(cells),
        torus in Just(torus),
        rx in 0..=size_x,
        ry in 0..=size_y,
        rc in 0..=cells,
    ) -> (TissueConfig, NeighbourhoodRadii) {
        let radii = NeighbourhoodRadii::new(rx, ry, rc);
        let config = TissueConfig {
            size_x,
            size_y,
            synapses_to_muscles: 0,
            torus: TorusConfig { x: torus.0, y: torus.1, columnar: torus.2 },
            cell_kinds: vec![CellKindConfig {
                cells_per_column: cells,
                territory_capacity: 1,
                cell_radius: radii,
                synapse_radius: radii,
            }],
            sensory_kinds: Vec::new(),
            ..Default::default()
        };
        (config, radii)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_torus_shift_stays_on_axis((length, coord, shift) in arb_axis()) {
        let moved = shift_coordinate(coord, shift, length, true);
        prop_assert!(moved < length);
        prop_assert_eq!(shift_coordinate(moved, -shift, length, true), coord);
    }

    #[test]
    fn test_non_torus_shift_is_exact_or_sentinel((length, coord, shift) in arb_axis()) {
        let moved = shift_coordinate(coord, shift, length, false);
        let target = i64::from(coord) + i64::from(shift);
        if (0..i64::from(length)).contains(&target) {
            prop_assert_eq!(i64::from(moved), target);
        } else {
            prop_assert_eq!(moved, length);
        }
    }

    #[test]
    fn test_clipped_shift_lands_inside((length, coord, shift) in arb_axis()) {
        let clipped = clip_shift(shift, coord, length);
        prop_assert!(clipped.unsigned_abs() <= shift.unsigned_abs());
        let moved = shift_coordinate(coord, clipped, length, false);
        prop_assert!(moved < length);
    }

    #[test]
    fn test_neighbourhood_resolves_inside_tissue(
        (config, radii) in arb_tissue(),
        picks in any::<(u32, u32, u32)>()
    ) {
        let config = Arc::new(StaticConfig::new(config).unwrap());
        let lengths = config.axis_lengths();
        let center = TissueCoordinates::new(
            picks.0 % lengths[0],
            picks.1 % lengths[1],
            picks.2 % lengths[2],
        );
        let neighbourhood = SpatialNeighbourhood::around(&config, center, radii);
        prop_assert!(neighbourhood.contains([0, 0, 0]));
        prop_assert_eq!(neighbourhood.shifts().count(), neighbourhood.len());
        for shift in neighbourhood.shifts() {
            let target = neighbourhood.resolve(&config, shift);
            prop_assert!(is_inside(target, lengths));
            prop_assert_eq!(
                target,
                shift_coordinates(center, shift, lengths, config.torus_flags())
            );
        }
    }
}
