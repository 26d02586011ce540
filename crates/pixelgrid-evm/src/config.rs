//! Per-network contract configuration resolver.
//!
//! Resolution order for every field: explicit environment variable →
//! on-disk deployment record → hard-coded default (production network
//! only) → error naming the missing variable. A malformed or missing
//! deployment record is treated as absent, never fatal. Resolution
//! happens before any RPC call, so a misconfigured non-default network
//! can never index against the wrong contract.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use pixelgrid_core::IndexError;

/// Networks the indexer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Sepolia,
    /// Local development chain.
    Sunet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Sepolia => "sepolia",
            Self::Sunet => "sunet",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Sepolia => "SEPOLIA",
            Self::Sunet => "SUNET",
        }
    }

    /// Only the production network carries hard-coded fallbacks.
    fn is_default(&self) -> bool {
        matches!(self, Self::Mainnet)
    }
}

impl FromStr for Network {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "sepolia" => Ok(Self::Sepolia),
            "sunet" => Ok(Self::Sunet),
            other => Err(IndexError::Config(format!(
                "unknown network '{other}' (expected mainnet, sepolia or sunet)"
            ))),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ready-to-query configuration for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub network: Network,
    pub rpc_url: String,
    pub primary_address: String,
    pub underlay_address: String,
    pub deployment_block: u64,
    pub token_uri_base: String,
    pub site_base: String,
}

/// On-disk deployment record (`deployments/<network>.json`), written by
/// the contract deployment tooling. Every field is optional; missing
/// fields fall through to the next resolution step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRecord {
    pub primary_address: Option<String>,
    pub underlay_address: Option<String>,
    pub deployment_block: Option<u64>,
    pub token_uri_base: Option<String>,
}

// Production deployment, used only when neither an env var nor a
// deployment record supplies the field.
const MAINNET_PRIMARY: &str = "0xE9e3F9cfc1A64DFca53614a0182CFAD56c10624F";
const MAINNET_UNDERLAY: &str = "0x273CAed9Ed51a1e72F7E4b15e922a86e86072cA7";
const MAINNET_DEPLOYMENT_BLOCK: u64 = 6_645_906;
const MAINNET_TOKEN_URI_BASE: &str = "https://tenthousandsu.com/erc721/";
const DEFAULT_SITE_BASE: &str = "https://tenthousandsu.com";

/// Resolve configuration from process env and `deployments/`.
pub fn resolve(network: Network, deployments_dir: &Path) -> Result<ResolvedConfig, IndexError> {
    let record = load_record(&deployments_dir.join(format!("{}.json", network.as_str())));
    resolve_with(network, |key| std::env::var(key).ok(), record)
}

/// Resolution core with an injectable env lookup (tests never touch
/// process env).
pub fn resolve_with(
    network: Network,
    env: impl Fn(&str) -> Option<String>,
    record: Option<DeployRecord>,
) -> Result<ResolvedConfig, IndexError> {
    let record = record.unwrap_or_default();
    let prefix = network.env_prefix();

    let field = |suffix: &str,
                 from_record: Option<String>,
                 default: Option<String>|
     -> Result<String, IndexError> {
        let var = format!("{prefix}_{suffix}");
        env(&var)
            .or(from_record)
            .or(if network.is_default() { default } else { None })
            .ok_or_else(|| {
                IndexError::Config(format!(
                    "{var} is not set and deployments/{}.json does not supply it",
                    network.as_str()
                ))
            })
    };

    let rpc_url = field("RPC_URL", None, None)?;
    let primary_address = field(
        "PRIMARY_ADDRESS",
        record.primary_address.clone(),
        Some(MAINNET_PRIMARY.into()),
    )?;
    let underlay_address = field(
        "UNDERLAY_ADDRESS",
        record.underlay_address.clone(),
        Some(MAINNET_UNDERLAY.into()),
    )?;
    let deployment_block = field(
        "DEPLOYMENT_BLOCK",
        record.deployment_block.map(|b| b.to_string()),
        Some(MAINNET_DEPLOYMENT_BLOCK.to_string()),
    )?
    .parse::<u64>()
    .map_err(|e| IndexError::Config(format!("{prefix}_DEPLOYMENT_BLOCK: {e}")))?;
    let token_uri_base = field(
        "TOKEN_URI_BASE",
        record.token_uri_base.clone(),
        Some(MAINNET_TOKEN_URI_BASE.into()),
    )?;

    let site_base = env("SITE_BASE").unwrap_or_else(|| DEFAULT_SITE_BASE.into());

    Ok(ResolvedConfig {
        network,
        rpc_url,
        primary_address,
        underlay_address,
        deployment_block,
        token_uri_base,
        site_base,
    })
}

fn load_record(path: &Path) -> Option<DeployRecord> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice::<DeployRecord>(&bytes) {
        Ok(r) => Some(r),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed deployment record");
            None
        }
    }
}
