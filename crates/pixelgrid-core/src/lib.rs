//! pixelgrid-core — foundation for the billboard chain-state indexer.
//!
//! # Architecture
//!
//! ```text
//! IndexRun (pixelgrid-evm) → Reconciler
//!                                ├── IndexerState    (checkpoint + square columns)
//!                                ├── SquareReader    (authoritative struct reads)
//!                                └── SquarePublisher (raster / SVG / metadata output)
//! ```
//!
//! This crate is pure domain logic: no RPC, no filesystem. The two trait
//! seams keep the reconciler testable with scripted readers and recording
//! publishers.

pub mod error;
pub mod events;
pub mod geometry;
pub mod reconcile;
pub mod state;

pub use error::IndexError;
pub use events::{PrimaryEvent, SoldEvent, SquareRecord, UnderlayEvent};
pub use reconcile::{reconcile, ReconcileSummary, SquarePublisher, SquareReader};
pub use state::{
    Checkpoint, IndexerState, Personalization, SquareExtra, UnderlayPersonalization,
    MAX_PRIMARY_EVENTS_PER_RUN, NUM_SQUARES, SETTLE_BLOCKS, SQUARE_PIXEL_BYTES,
};
