//! Decoded on-chain events and the authoritative square struct.
//!
//! These are chain-agnostic values: log decoding lives in pixelgrid-evm,
//! the reconciler only sees these types.

/// A `Transfer` from the primary contract itself — a square was sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoldEvent {
    pub square: u64,
    pub block: u64,
}

/// A `PersonalizedUnderlay` event, payload included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderlayEvent {
    pub square: u64,
    pub title: String,
    pub href: String,
    /// Raw 300-byte pixel buffer.
    pub rgb: Vec<u8>,
    pub block: u64,
}

/// A primary-contract `Personalized` event. Carries no content: the
/// reconciler re-reads the current on-chain struct instead of trusting
/// any payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryEvent {
    pub square: u64,
    pub block: u64,
}

/// The current on-chain struct for one square, as returned by the
/// `suSquares(uint256)` view call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquareRecord {
    pub version: u64,
    pub rgb: Vec<u8>,
    pub title: String,
    pub href: String,
}

impl SquareRecord {
    /// Whether the primary contract actually holds content for this square:
    /// a non-empty title or href, or pixel data that is not all-black.
    pub fn is_personalized(&self) -> bool {
        !self.title.is_empty() || !self.href.is_empty() || self.rgb.iter().any(|&b| b != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, href: &str, rgb: Vec<u8>) -> SquareRecord {
        SquareRecord {
            version: 1,
            rgb,
            title: title.into(),
            href: href.into(),
        }
    }

    #[test]
    fn all_black_and_empty_is_not_personalized() {
        assert!(!record("", "", vec![0; 300]).is_personalized());
    }

    #[test]
    fn any_content_counts() {
        assert!(record("t", "", vec![0; 300]).is_personalized());
        assert!(record("", "http://x", vec![0; 300]).is_personalized());

        let mut rgb = vec![0u8; 300];
        rgb[299] = 1;
        assert!(record("", "", rgb).is_personalized());
    }
}
