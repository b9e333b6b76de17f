//! Toroidal and clipped coordinate arithmetic.
//!
//! A shift along a torus axis wraps modulo the axis length. Along a
//! non-torus axis a shift that leaves `[0, L)` yields the sentinel `L`,
//! meaning "no neighbour here".

use synaptome_data::{Shift, TissueCoordinates};

/// Shifts `coord` by `shift` along an axis of length `axis_length`.
///
/// # Panics
/// When `coord` is outside the axis or `|shift|` exceeds the axis length.
#[inline]
pub fn shift_coordinate(coord: u32, shift: i32, axis_length: u32, is_torus: bool) -> u32 {
    assert!(
        coord < axis_length,
        "coordinate {coord} outside axis of length {axis_length}"
    );
    assert!(
        shift.unsigned_abs() <= axis_length,
        "shift {shift} longer than axis of length {axis_length}"
    );
    let length = i64::from(axis_length);
    let moved = i64::from(coord) + i64::from(shift);
    if is_torus {
        ((length + moved) % length) as u32
    } else if (0..length).contains(&moved) {
        moved as u32
    } else {
        axis_length
    }
}

/// Applies [`shift_coordinate`] per axis.
#[inline]
pub fn shift_coordinates(
    coords: TissueCoordinates,
    shift: Shift,
    axis_lengths: [u32; 3],
    torus_flags: [bool; 3],
) -> TissueCoordinates {
    let c = coords.as_array();
    TissueCoordinates::new(
        shift_coordinate(c[0], shift[0], axis_lengths[0], torus_flags[0]),
        shift_coordinate(c[1], shift[1], axis_lengths[1], torus_flags[1]),
        shift_coordinate(c[2], shift[2], axis_lengths[2], torus_flags[2]),
    )
}

/// True when no axis of `coords` holds the sentinel.
#[inline]
pub fn is_inside(coords: TissueCoordinates, axis_lengths: [u32; 3]) -> bool {
    coords.x < axis_lengths[0] && coords.y < axis_lengths[1] && coords.c < axis_lengths[2]
}

/// Clamps `shift` so that `origin + shift` stays within `[0, L - 1]`.
#[inline]
pub fn clip_shift(shift: i32, origin: u32, axis_length: u32) -> i32 {
    assert!(
        origin < axis_length,
        "origin {origin} outside axis of length {axis_length}"
    );
    let low = -i64::from(origin);
    let high = i64::from(axis_length - 1 - origin);
    i64::from(shift).clamp(low, high) as i32
}
