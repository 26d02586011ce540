//! pixelgrid-artifacts — the materialized outputs of the indexer.
//!
//! Three artifacts per visible-state change, all written idempotently
//! (overwrite in place, filenames keyed by the 5-digit square id):
//!
//! - the composited whole-board raster (`wholeSquare.png`, 1000×1000)
//! - a per-square SVG card (`{paddedId}.svg`)
//! - a per-square metadata document (`{paddedId}.json`)
//!
//! Raster tiles are staged in memory and composited in a single flush per
//! run.

pub mod board;
pub mod metadata;
pub mod publisher;
pub mod svg;

pub use board::{BoardImage, BOARD_DIM};
pub use publisher::FilePublisher;

/// The 5-digit zero-padded form of a square id, used for all artifact
/// filenames.
pub fn padded_id(square: u64) -> String {
    format!("{square:05}")
}
