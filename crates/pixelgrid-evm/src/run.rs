//! One indexing run — fetch, reconcile, advance the checkpoint.
//!
//! A run processes the window `(loaded_to, end]` where
//! `end = min(loaded_to + max_blocks, head - settle_blocks)`, pulling the
//! three event streams sequentially (sales, underlay personalizations,
//! primary personalizations) and handing them to the reconciler. RPC
//! calls are awaited one at a time by design: provider rate limits and
//! the sold-before-personalized category order must never be violated by
//! interleaving.

use async_trait::async_trait;

use pixelgrid_core::{
    reconcile, IndexError, IndexerState, PrimaryEvent, ReconcileSummary, SoldEvent,
    SquarePublisher, SquareReader, SquareRecord, UnderlayEvent, SETTLE_BLOCKS,
};

use crate::abi;
use crate::config::ResolvedConfig;
use crate::fetcher::{ChunkedLogFetcher, EvmRpcClient, LogFilter};

/// Knobs for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Cap on blocks processed this run (`--blocks`); `None` = up to the
    /// settled head.
    pub max_blocks: Option<u64>,
    /// Blocks below head left unprocessed as a reorg margin.
    pub settle_blocks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_blocks: None,
            settle_blocks: SETTLE_BLOCKS,
        }
    }
}

/// What one run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to do: the checkpoint is already at the settled head.
    UpToDate { head: u64 },
    /// A window was processed and the checkpoint advanced to `to`.
    Processed {
        from: u64,
        to: u64,
        summary: ReconcileSummary,
    },
}

/// `SquareReader` over `eth_call` against the primary contract.
pub struct RpcSquareReader<'a, C> {
    client: &'a C,
    contract: &'a str,
}

impl<'a, C: EvmRpcClient> RpcSquareReader<'a, C> {
    pub fn new(client: &'a C, contract: &'a str) -> Self {
        Self { client, contract }
    }
}

#[async_trait]
impl<C: EvmRpcClient> SquareReader for RpcSquareReader<'_, C> {
    async fn read_square(&self, square: u64) -> Result<SquareRecord, IndexError> {
        let result = self
            .client
            .call(self.contract, &abi::su_squares_calldata(square))
            .await?;
        abi::decode_su_squares(&result)
    }
}

/// Execute one run against `state`. On success the checkpoint has
/// advanced; persistence is the caller's job, and happens only after the
/// publisher flush succeeds.
pub async fn run_window<C, P>(
    client: &C,
    cfg: &ResolvedConfig,
    fetcher: &ChunkedLogFetcher,
    state: &mut IndexerState,
    publisher: &mut P,
    run: &RunConfig,
) -> Result<RunOutcome, IndexError>
where
    C: EvmRpcClient,
    P: SquarePublisher,
{
    let head = client.get_block_number().await?;
    let settled = head.saturating_sub(run.settle_blocks);

    let mut end = settled;
    if let Some(max) = run.max_blocks {
        end = end.min(state.loaded_to.saturating_add(max));
    }
    if end <= state.loaded_to {
        tracing::info!(head, loaded_to = state.loaded_to, "already at settled head");
        return Ok(RunOutcome::UpToDate { head });
    }
    let from = state.loaded_to + 1;

    tracing::info!(from, to = end, head, network = %cfg.network, "processing window");

    let sold_filter = LogFilter::address(cfg.primary_address.clone())
        .topic(abi::transfer_topic())
        .topic(abi::address_topic(&cfg.primary_address)?);
    let underlay_filter =
        LogFilter::address(cfg.underlay_address.clone()).topic(abi::personalized_underlay_topic());
    let primary_filter =
        LogFilter::address(cfg.primary_address.clone()).topic(abi::personalized_topic());

    let sold_logs = fetcher.fetch(client, &sold_filter, from, end).await?;
    let underlay_logs = fetcher.fetch(client, &underlay_filter, from, end).await?;
    let primary_logs = fetcher.fetch(client, &primary_filter, from, end).await?;

    let sold: Vec<SoldEvent> = sold_logs.iter().map(abi::decode_sold).collect::<Result<_, _>>()?;
    let underlays: Vec<UnderlayEvent> = underlay_logs
        .iter()
        .map(abi::decode_underlay)
        .collect::<Result<_, _>>()?;
    let primaries: Vec<PrimaryEvent> = primary_logs
        .iter()
        .map(abi::decode_primary)
        .collect::<Result<_, _>>()?;

    let reader = RpcSquareReader::new(client, &cfg.primary_address);
    let summary = reconcile(state, &sold, &underlays, &primaries, &reader, publisher).await?;

    state.loaded_to = end;
    Ok(RunOutcome::Processed {
        from,
        to: end,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::RawLog;
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::U256;
    use pixelgrid_core::{Personalization, SquareExtra};

    /// Scripted chain: head plus raw logs served by topic0.
    struct ScriptedChain {
        head: u64,
        logs: Vec<RawLog>,
        record: SquareRecord,
    }

    #[async_trait]
    impl EvmRpcClient for ScriptedChain {
        async fn get_block_number(&self) -> Result<u64, IndexError> {
            Ok(self.head)
        }

        async fn get_logs(
            &self,
            from: u64,
            to: u64,
            filter: &LogFilter,
        ) -> Result<Vec<RawLog>, IndexError> {
            let topic0 = filter.topics.first().cloned().flatten();
            Ok(self
                .logs
                .iter()
                .filter(|l| {
                    let b = l.block_number_u64();
                    b >= from && b <= to && l.topics.first() == topic0.as_ref()
                })
                .cloned()
                .collect())
        }

        async fn call(&self, _to: &str, _data: &str) -> Result<String, IndexError> {
            let encoded = DynSolValue::Tuple(vec![
                DynSolValue::Uint(U256::from(self.record.version), 96),
                DynSolValue::Bytes(self.record.rgb.clone()),
                DynSolValue::String(self.record.title.clone()),
                DynSolValue::String(self.record.href.clone()),
            ])
            .abi_encode_params();
            Ok(format!("0x{}", hex::encode(encoded)))
        }
    }

    #[derive(Default)]
    struct NullPublisher {
        published: Vec<u64>,
    }

    impl SquarePublisher for NullPublisher {
        fn publish(
            &mut self,
            square: u64,
            _title: &str,
            _href: &str,
            _rgb: &[u8],
        ) -> Result<(), IndexError> {
            self.published.push(square);
            Ok(())
        }
    }

    fn cfg() -> ResolvedConfig {
        ResolvedConfig {
            network: crate::Network::Sunet,
            rpc_url: "http://localhost:8545".into(),
            primary_address: "0xE9e3F9cfc1A64DFca53614a0182CFAD56c10624F".into(),
            underlay_address: "0x273CAed9Ed51a1e72F7E4b15e922a86e86072cA7".into(),
            deployment_block: 0,
            token_uri_base: "http://localhost/erc721/".into(),
            site_base: "http://localhost".into(),
        }
    }

    fn sold_log(cfg: &ResolvedConfig, square: u64, block: u64) -> RawLog {
        RawLog {
            address: cfg.primary_address.clone(),
            topics: vec![
                abi::transfer_topic(),
                abi::address_topic(&cfg.primary_address).unwrap(),
                format!("0x{:064x}", 1u64),
                format!("0x{square:064x}"),
            ],
            data: "0x".into(),
            block_number: format!("0x{block:x}"),
            tx_hash: "0x0".into(),
            log_index: "0x0".into(),
        }
    }

    fn primary_log(cfg: &ResolvedConfig, square: u64, block: u64) -> RawLog {
        let data = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(square), 256)])
            .abi_encode_params();
        RawLog {
            address: cfg.primary_address.clone(),
            topics: vec![abi::personalized_topic()],
            data: format!("0x{}", hex::encode(data)),
            block_number: format!("0x{block:x}"),
            tx_hash: "0x0".into(),
            log_index: "0x1".into(),
        }
    }

    fn empty_record() -> SquareRecord {
        SquareRecord {
            version: 0,
            rgb: vec![0; 300],
            title: String::new(),
            href: String::new(),
        }
    }

    #[tokio::test]
    async fn window_is_capped_by_settle_margin_and_blocks() {
        let cfg = cfg();
        let chain = ScriptedChain {
            head: 1000,
            logs: vec![sold_log(&cfg, 42, 150)],
            record: empty_record(),
        };
        let fetcher = ChunkedLogFetcher::new(10_000, 10);
        let mut state = IndexerState::new(100);
        let mut publisher = NullPublisher::default();

        let run = RunConfig {
            max_blocks: Some(500),
            settle_blocks: 12,
        };
        let outcome = run_window(&chain, &cfg, &fetcher, &mut state, &mut publisher, &run)
            .await
            .unwrap();

        // end = min(100 + 500, 1000 - 12) = 600
        assert!(matches!(outcome, RunOutcome::Processed { from: 101, to: 600, .. }));
        assert_eq!(state.loaded_to, 600);
        assert_eq!(state.extra[41], Some(SquareExtra(150, 150, false, 0)));
        assert_eq!(publisher.published, vec![42]);
    }

    #[tokio::test]
    async fn up_to_date_run_is_a_noop() {
        let cfg = cfg();
        let chain = ScriptedChain {
            head: 112,
            logs: vec![],
            record: empty_record(),
        };
        let fetcher = ChunkedLogFetcher::new(10_000, 10);
        let mut state = IndexerState::new(100);
        let mut publisher = NullPublisher::default();

        let outcome = run_window(
            &chain,
            &cfg,
            &fetcher,
            &mut state,
            &mut publisher,
            &RunConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RunOutcome::UpToDate { head: 112 });
        assert_eq!(state.loaded_to, 100);
        assert!(publisher.published.is_empty());
    }

    #[tokio::test]
    async fn primary_event_reads_struct_through_rpc() {
        let cfg = cfg();
        let chain = ScriptedChain {
            head: 1000,
            logs: vec![sold_log(&cfg, 7, 150), primary_log(&cfg, 7, 200)],
            record: SquareRecord {
                version: 2,
                rgb: vec![0x42; 300],
                title: "P".into(),
                href: "http://p".into(),
            },
        };
        let fetcher = ChunkedLogFetcher::new(10_000, 10);
        let mut state = IndexerState::new(100);
        let mut publisher = NullPublisher::default();

        run_window(
            &chain,
            &cfg,
            &fetcher,
            &mut state,
            &mut publisher,
            &RunConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(state.extra[6], Some(SquareExtra(150, 200, true, 2)));
        assert_eq!(state.personalizations[6], Some(Personalization::new("P", "http://p")));
    }
}
