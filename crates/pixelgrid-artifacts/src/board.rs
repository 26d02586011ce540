//! The composited whole-board raster.
//!
//! Holds the full 1000×1000 RGB buffer in memory (3 MB). `paint` blits
//! one square's 10×10 tile; `save` encodes the whole board back to PNG.
//! Loading the existing raster first keeps previously painted squares
//! intact across runs.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use pixelgrid_core::{geometry, IndexError, SQUARE_PIXEL_BYTES};

/// Board side length in pixels (100 squares × 10 px).
pub const BOARD_DIM: usize = 1_000;

const CHANNELS: usize = 3;
const TILE_DIM: usize = 10;

/// In-memory whole-board raster.
pub struct BoardImage {
    pixels: Vec<u8>,
    staged: usize,
}

impl BoardImage {
    /// A fresh all-white board.
    pub fn new() -> Self {
        Self {
            pixels: vec![0xFF; BOARD_DIM * BOARD_DIM * CHANNELS],
            staged: 0,
        }
    }

    /// Load the existing raster, or start fresh if it is missing. A file
    /// with unexpected dimensions or color type is an error, not silently
    /// replaced.
    pub fn load_or_new(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let file = File::open(path)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;
        let decoder = png::Decoder::new(file);
        let mut reader = decoder
            .read_info()
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;

        if info.width as usize != BOARD_DIM
            || info.height as usize != BOARD_DIM
            || info.color_type != png::ColorType::Rgb
            || info.bit_depth != png::BitDepth::Eight
        {
            return Err(IndexError::Artifact(format!(
                "{}: expected {BOARD_DIM}x{BOARD_DIM} 8-bit RGB, found {}x{} {:?}/{:?}",
                path.display(),
                info.width,
                info.height,
                info.color_type,
                info.bit_depth,
            )));
        }

        buf.truncate(info.buffer_size());
        Ok(Self {
            pixels: buf,
            staged: 0,
        })
    }

    /// Blit one square's 300-byte tile at pixel offset
    /// `(10·(col−1), 10·(row−1))`.
    pub fn paint(&mut self, square: u64, rgb: &[u8]) {
        debug_assert_eq!(rgb.len(), SQUARE_PIXEL_BYTES);
        let x0 = (geometry::column(square) as usize - 1) * TILE_DIM;
        let y0 = (geometry::row(square) as usize - 1) * TILE_DIM;

        for ty in 0..TILE_DIM {
            let src = ty * TILE_DIM * CHANNELS;
            let dst = ((y0 + ty) * BOARD_DIM + x0) * CHANNELS;
            self.pixels[dst..dst + TILE_DIM * CHANNELS]
                .copy_from_slice(&rgb[src..src + TILE_DIM * CHANNELS]);
        }
        self.staged += 1;
    }

    /// Number of tiles painted since load.
    pub fn staged(&self) -> usize {
        self.staged
    }

    /// Encode the board to PNG at `path`, overwriting in place.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let file = File::create(path)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;
        let mut encoder =
            png::Encoder::new(BufWriter::new(file), BOARD_DIM as u32, BOARD_DIM as u32);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;
        writer
            .write_image_data(&self.pixels)
            .map_err(|e| IndexError::Artifact(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Pixel at board coordinates, for tests and spot checks.
    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * BOARD_DIM + x) * CHANNELS;
        (self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }
}

impl Default for BoardImage {
    fn default() -> Self {
        Self::new()
    }
}
