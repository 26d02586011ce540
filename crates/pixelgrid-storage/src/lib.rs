//! pixelgrid-storage — the artifact files *are* the database.
//!
//! Four JSON files per network hold the whole indexer state: the
//! checkpoint and the three square-indexed columns. Persistence is not
//! transactional across the files; instead the checkpoint is written
//! strictly last, so a crash mid-save leaves a stale checkpoint and the
//! next run safely reprocesses the same window.

pub mod fs;
pub mod paths;

pub use fs::StateStore;
pub use paths::BuildPaths;
