//! Board state — the checkpoint plus three square-indexed columns.
//!
//! All columns have fixed length [`NUM_SQUARES`]; square id `s` (1-based)
//! lives at index `s - 1`. The on-disk representation of each entry is a
//! fixed-shape JSON array (`[title, href]` etc.), so the entry types are
//! tuple structs: serde derives emit exactly that shape.

use serde::{Deserialize, Serialize};

/// Number of squares on the board (100 × 100).
pub const NUM_SQUARES: usize = 10_000;

/// Bytes of raw pixel data per square (10 × 10 px × 3 RGB channels).
pub const SQUARE_PIXEL_BYTES: usize = 300;

/// Blocks below the chain head the indexer refuses to process, so that a
/// shallow reorg cannot invalidate persisted state.
pub const SETTLE_BLOCKS: u64 = 12;

/// Abort threshold for primary `Personalized` events in a single run.
/// Each one costs an extra RPC round trip (a struct re-read), so a burst
/// above this means the caller should process fewer blocks per run.
pub const MAX_PRIMARY_EVENTS_PER_RUN: usize = 100;

/// The neutral pixel value published for a sold-but-unpersonalized square.
pub const NEUTRAL_GRAY: u8 = 0xDD;

/// A 300-byte buffer of the neutral gray.
pub fn neutral_pixels() -> Vec<u8> {
    vec![NEUTRAL_GRAY; SQUARE_PIXEL_BYTES]
}

// ─── Column entry types ───────────────────────────────────────────────────────

/// Displayed title/link pair for a square, stored as `[title, href]`.
///
/// This is the state *after* precedence resolution: it holds whichever of
/// the primary or underlay content is currently visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personalization(pub String, pub String);

impl Personalization {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self(title.into(), href.into())
    }

    /// The empty pair published for a square with no visible content.
    pub fn empty() -> Self {
        Self(String::new(), String::new())
    }

    pub fn title(&self) -> &str {
        &self.0
    }

    pub fn href(&self) -> &str {
        &self.1
    }
}

/// Raw underlay-contract record, stored as `[title, href, rgbHex]`.
///
/// Kept even while a primary personalization covers it: the primary can be
/// un-set later, at which point the underlay becomes visible again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlayPersonalization(pub String, pub String, pub String);

impl UnderlayPersonalization {
    pub fn title(&self) -> &str {
        &self.0
    }

    pub fn href(&self) -> &str {
        &self.1
    }

    /// Hex encoding of the 300-byte pixel buffer.
    pub fn rgb_hex(&self) -> &str {
        &self.2
    }
}

/// Bookkeeping for a sold square, stored as
/// `[mintedBlock, updatedBlock, isMainPersonalized, version]`.
///
/// `isMainPersonalized` is the precedence flag: it records whether the
/// *primary* contract currently holds non-empty data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareExtra(pub u64, pub u64, pub bool, pub u64);

impl SquareExtra {
    pub fn minted_block(&self) -> u64 {
        self.0
    }

    pub fn updated_block(&self) -> u64 {
        self.1
    }

    pub fn is_main_personalized(&self) -> bool {
        self.2
    }

    pub fn version(&self) -> u64 {
        self.3
    }
}

// ─── Checkpoint ───────────────────────────────────────────────────────────────

/// Last block fully processed (inclusive). Monotonically non-decreasing
/// across runs and never above `head - SETTLE_BLOCKS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    pub loaded_to: u64,
}

// ─── IndexerState ─────────────────────────────────────────────────────────────

/// The full in-memory board state: checkpoint plus the three parallel
/// square-indexed columns.
///
/// Passed by `&mut` through the reconciler and returned for persistence —
/// there is no ambient/global state.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerState {
    pub loaded_to: u64,
    pub personalizations: Vec<Option<Personalization>>,
    pub underlays: Vec<Option<UnderlayPersonalization>>,
    pub extra: Vec<Option<SquareExtra>>,
}

impl IndexerState {
    /// Fresh state: all squares null, checkpoint at the deployment block.
    pub fn new(deployment_block: u64) -> Self {
        Self {
            loaded_to: deployment_block,
            personalizations: vec![None; NUM_SQUARES],
            underlays: vec![None; NUM_SQUARES],
            extra: vec![None; NUM_SQUARES],
        }
    }

    /// Array index for a 1-based square id.
    pub fn index(square: u64) -> usize {
        debug_assert!((1..=NUM_SQUARES as u64).contains(&square));
        (square - 1) as usize
    }
}
