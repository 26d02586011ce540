//! Network-qualified build directory layout.

use std::path::{Path, PathBuf};

/// Locations of every persisted artifact for one network.
///
/// ```text
/// build/<network>/
///   loadedTo.json
///   squarePersonalizations.json
///   underlayPersonalizations.json
///   squareExtra.json
///   wholeSquare.png
///   erc721/{paddedId}.json, {paddedId}.svg
/// ```
#[derive(Debug, Clone)]
pub struct BuildPaths {
    root: PathBuf,
}

impl BuildPaths {
    pub fn for_network(base: &Path, network: &str) -> Self {
        Self {
            root: base.join(network),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn loaded_to(&self) -> PathBuf {
        self.root.join("loadedTo.json")
    }

    pub fn personalizations(&self) -> PathBuf {
        self.root.join("squarePersonalizations.json")
    }

    pub fn underlays(&self) -> PathBuf {
        self.root.join("underlayPersonalizations.json")
    }

    pub fn square_extra(&self) -> PathBuf {
        self.root.join("squareExtra.json")
    }

    pub fn whole_board(&self) -> PathBuf {
        self.root.join("wholeSquare.png")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("erc721")
    }
}
