//! The file-backed artifact publisher.
//!
//! Implements the reconciler's `SquarePublisher` seam: each publish
//! stages the square's tile on the board raster and rewrites its SVG and
//! metadata files. The raster itself is written once, in `flush`, after
//! the whole window has reconciled.

use std::fs;
use std::path::PathBuf;

use pixelgrid_core::{IndexError, SquarePublisher};

use crate::board::BoardImage;
use crate::{metadata, padded_id, svg};

/// Writes per-square artifacts and composes the whole-board raster.
pub struct FilePublisher {
    board: BoardImage,
    board_path: PathBuf,
    metadata_dir: PathBuf,
    token_uri_base: String,
    site_base: String,
}

impl FilePublisher {
    /// Open against a build directory, loading the existing board raster
    /// if present.
    pub fn open(
        board_path: PathBuf,
        metadata_dir: PathBuf,
        token_uri_base: impl Into<String>,
        site_base: impl Into<String>,
    ) -> Result<Self, IndexError> {
        fs::create_dir_all(&metadata_dir)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", metadata_dir.display())))?;
        Ok(Self {
            board: BoardImage::load_or_new(&board_path)?,
            board_path,
            metadata_dir,
            token_uri_base: token_uri_base.into(),
            site_base: site_base.into(),
        })
    }

    /// Write the composited board raster if any tile was staged this run.
    pub fn flush(&mut self) -> Result<(), IndexError> {
        if self.board.staged() == 0 {
            return Ok(());
        }
        self.board.save(&self.board_path)?;
        tracing::info!(
            tiles = self.board.staged(),
            path = %self.board_path.display(),
            "board raster written"
        );
        Ok(())
    }
}

impl SquarePublisher for FilePublisher {
    fn publish(
        &mut self,
        square: u64,
        title: &str,
        _href: &str,
        rgb: &[u8],
    ) -> Result<(), IndexError> {
        self.board.paint(square, rgb);

        let padded = padded_id(square);
        let svg_path = self.metadata_dir.join(format!("{padded}.svg"));
        fs::write(&svg_path, svg::render(square, rgb))
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", svg_path.display())))?;

        let doc = metadata::build(square, title, &self.token_uri_base, &self.site_base);
        let json_path = self.metadata_dir.join(format!("{padded}.json"));
        let body = serde_json::to_vec_pretty(&doc)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", json_path.display())))?;
        fs::write(&json_path, body)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", json_path.display())))?;

        Ok(())
    }
}
