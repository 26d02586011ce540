//! Chunked event-log fetcher.
//!
//! JSON-RPC providers cap `eth_getLogs` result sets and response times,
//! and the acceptable range size is not knowable up front — it can change
//! mid-scan. The fetcher walks a block range in windows, halving the
//! window on a range-attributable rejection (retrying the same sub-range)
//! and doubling it back after success, never above the initial size and
//! never below the floor. A failure at the floor is surfaced: there are
//! no silent partial results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pixelgrid_core::IndexError;

/// Default window size in blocks (`RPC_LOGS_CHUNK_SIZE`).
pub const DEFAULT_CHUNK_SIZE: u64 = 10_000;

/// Default window floor in blocks (`RPC_LOGS_MIN_CHUNK_SIZE`).
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 100;

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
}

impl RawLog {
    /// Returns the block number as u64.
    pub fn block_number_u64(&self) -> u64 {
        parse_hex_u64(&self.block_number)
    }

    /// Returns the log index as u32.
    pub fn log_index_u32(&self) -> u32 {
        parse_hex_u64(&self.log_index) as u32
    }
}

/// Address + topics filter for one `eth_getLogs` query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogFilter {
    pub address: Option<String>,
    /// Positional topic filter; `None` entries match anything.
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    pub fn address(addr: impl Into<String>) -> Self {
        Self {
            address: Some(addr.into()),
            topics: vec![],
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(Some(topic.into()));
        self
    }
}

/// Trait for fetching EVM data from a JSON-RPC provider.
#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn get_block_number(&self) -> Result<u64, IndexError>;
    async fn get_logs(
        &self,
        from: u64,
        to: u64,
        filter: &LogFilter,
    ) -> Result<Vec<RawLog>, IndexError>;
    /// `eth_call` against the latest block; `data` and the result are
    /// 0x-prefixed hex.
    async fn call(&self, to: &str, data: &str) -> Result<String, IndexError>;
}

// ─── Window state machine ─────────────────────────────────────────────────────

/// Adaptive window sizing for the chunked fetch.
///
/// Invariants: `min <= window <= initial`; `shrink` always halves (floored
/// at `min`), `grow` always doubles (capped at `initial`).
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    window: u64,
    initial: u64,
    min: u64,
}

impl ChunkPlanner {
    pub fn new(initial: u64, min: u64) -> Self {
        let initial = initial.max(1);
        let min = min.clamp(1, initial);
        Self {
            window: initial,
            initial,
            min,
        }
    }

    /// Current window size in blocks.
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Halve the window after a range rejection. Returns `false` if the
    /// window was already at the floor — the fetch must then fail hard.
    pub fn shrink(&mut self) -> bool {
        if self.window <= self.min {
            return false;
        }
        self.window = (self.window / 2).max(self.min);
        true
    }

    /// Double the window back toward the initial size after a success.
    pub fn grow(&mut self) {
        self.window = (self.window.saturating_mul(2)).min(self.initial);
    }
}

// ─── Fetcher ──────────────────────────────────────────────────────────────────

/// Fetches the exact union of matching logs over `[from, to]`, in
/// ascending `(block, log index)` order, with no gaps and no duplicates.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedLogFetcher {
    initial: u64,
    min: u64,
}

impl ChunkedLogFetcher {
    pub fn new(initial: u64, min: u64) -> Self {
        Self { initial, min }
    }

    /// Build from `RPC_LOGS_CHUNK_SIZE` / `RPC_LOGS_MIN_CHUNK_SIZE`,
    /// resolved through an injectable lookup so tests never touch process
    /// env.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: u64| {
            env(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };
        Self::new(
            read("RPC_LOGS_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            read("RPC_LOGS_MIN_CHUNK_SIZE", DEFAULT_MIN_CHUNK_SIZE),
        )
    }

    pub async fn fetch<C: EvmRpcClient>(
        &self,
        client: &C,
        filter: &LogFilter,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLog>, IndexError> {
        if to < from {
            return Ok(vec![]);
        }

        let mut planner = ChunkPlanner::new(self.initial, self.min);
        let mut logs: Vec<RawLog> = Vec::new();
        let mut cursor = from;

        while cursor <= to {
            let end = (cursor + planner.window() - 1).min(to);
            match client.get_logs(cursor, end, filter).await {
                Ok(chunk) => {
                    logs.extend(chunk);
                    cursor = end + 1;
                    planner.grow();
                }
                Err(e) if e.is_range_limit() => {
                    // Retry the same sub-range with a smaller window; the
                    // cursor does not advance.
                    if !planner.shrink() {
                        return Err(e);
                    }
                    tracing::debug!(
                        from = cursor,
                        window = planner.window(),
                        "provider rejected range, shrinking window"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        logs.sort_by_key(|l| (l.block_number_u64(), l.log_index_u32()));
        Ok(logs)
    }
}

/// Parse a hex-encoded string (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> u64 {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).unwrap_or(0)
}
