//! pixelgrid-evm — chain access for the billboard indexer.
//!
//! # Architecture
//!
//! ```text
//! IndexRun (run)
//!     ├── ContractConfigResolver (config)  — per-network addresses + RPC
//!     ├── ChunkedLogFetcher     (fetcher) — adaptive eth_getLogs windows
//!     ├── abi                              — topics, event + call codecs
//!     └── HttpRpcClient         (rpc)     — JSON-RPC 2.0 over reqwest
//! ```

pub mod abi;
pub mod config;
pub mod fetcher;
pub mod rpc;
pub mod run;

pub use config::{DeployRecord, Network, ResolvedConfig};
pub use fetcher::{ChunkPlanner, ChunkedLogFetcher, EvmRpcClient, LogFilter, RawLog};
pub use rpc::HttpRpcClient;
pub use run::{run_window, RpcSquareReader, RunConfig, RunOutcome};
