//! Square geometry — pure mappings from a square id to its grid position.
//!
//! The board is a 100×100 grid; square ids are 1-based and count
//! left-to-right, top-to-bottom. No state, no error cases: ids outside
//! `1..=10000` are caller bugs.

use crate::state::NUM_SQUARES;

/// Grid dimension (squares per side).
pub const GRID_DIM: u64 = 100;

/// 1-based row of a square.
pub fn row(square: u64) -> u64 {
    debug_assert!((1..=NUM_SQUARES as u64).contains(&square));
    (square - 1) / GRID_DIM + 1
}

/// 1-based column of a square.
pub fn column(square: u64) -> u64 {
    debug_assert!((1..=NUM_SQUARES as u64).contains(&square));
    (square - 1) % GRID_DIM + 1
}

/// Minimum Manhattan distance from a square to any of the four center
/// squares (50,50), (50,51), (51,50), (51,51).
pub fn manhattan_distance_to_center(square: u64) -> u64 {
    let r = row(square) as i64;
    let c = column(square) as i64;
    let d = |cr: i64, cc: i64| ((r - cr).abs() + (c - cc).abs()) as u64;
    d(50, 50).min(d(50, 51)).min(d(51, 50)).min(d(51, 51))
}
