//! pixelgrid — rebuild the billboard's square state from on-chain events.
//!
//! One invocation processes one block window and exits:
//!
//! ```bash
//! pixelgrid --network=sepolia --blocks=50000
//! ```
//!
//! State and artifacts land under `build/<network>/`; a crash mid-run
//! leaves the previous checkpoint intact and the next run reprocesses
//! the same window.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pixelgrid_artifacts::FilePublisher;
use pixelgrid_evm::{config, run_window, ChunkedLogFetcher, HttpRpcClient, Network, RunConfig, RunOutcome};
use pixelgrid_storage::{BuildPaths, StateStore};

#[derive(Parser)]
#[command(
    name = "pixelgrid",
    about = "Chain-state indexer for the 10,000-square pixel billboard",
    version
)]
struct Cli {
    /// Network to index: mainnet, sepolia or sunet (default: $CHAIN or mainnet)
    #[arg(long)]
    network: Option<String>,

    /// Cap on blocks processed this run (default: up to the settled head)
    #[arg(long)]
    blocks: Option<u64>,

    /// Build output directory
    #[arg(long, default_value = "build")]
    out: PathBuf,

    /// Directory of deployment record JSON files
    #[arg(long, default_value = "deployments")]
    deployments: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let network: Network = cli
        .network
        .or_else(|| std::env::var("CHAIN").ok())
        .unwrap_or_else(|| "mainnet".into())
        .parse()?;

    let cfg = config::resolve(network, &cli.deployments)?;
    let paths = BuildPaths::for_network(&cli.out, network.as_str());
    let store = StateStore::new(paths.clone());
    let mut state = store.load(cfg.deployment_block)?;

    let client = HttpRpcClient::new(&cfg.rpc_url)?;
    let fetcher = ChunkedLogFetcher::from_env(|key| std::env::var(key).ok());
    let mut publisher = FilePublisher::open(
        paths.whole_board(),
        paths.metadata_dir(),
        cfg.token_uri_base.clone(),
        cfg.site_base.clone(),
    )?;

    let run = RunConfig {
        max_blocks: cli.blocks,
        ..Default::default()
    };

    match run_window(&client, &cfg, &fetcher, &mut state, &mut publisher, &run).await? {
        RunOutcome::UpToDate { head } => {
            tracing::info!(head, loaded_to = state.loaded_to, "nothing to do");
        }
        RunOutcome::Processed { from, to, summary } => {
            publisher.flush()?;
            store
                .save(&state)
                .context("persisting state after a processed window")?;
            tracing::info!(
                from,
                to,
                sold = summary.sold,
                underlays = summary.underlays,
                primaries = summary.primaries,
                published = summary.published,
                "run complete"
            );
        }
    }

    Ok(())
}
