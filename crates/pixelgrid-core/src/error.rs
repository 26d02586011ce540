//! Error types for the indexing pipeline.

use thiserror::Error;

/// Errors that can occur while rebuilding board state.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(
        "{count} primary personalization events in one run exceeds the limit of {limit}; \
         re-run with a smaller --blocks window"
    )]
    TooManyPrimaryEvents { count: usize, limit: usize },
}

impl IndexError {
    /// Returns `true` if a log query failed because the provider capped the
    /// result set or timed out on the requested block range. These are the
    /// errors the chunked fetcher recovers from by shrinking its window.
    pub fn is_range_limit(&self) -> bool {
        match self {
            Self::Rpc(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("more than")
                    || msg.contains("too many")
                    || msg.contains("too large")
                    || msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("limit exceeded")
                    || msg.contains("block range")
                    || msg.contains("-32005")
            }
            _ => false,
        }
    }
}
