//! Inspector configuration
//!
//! Everything a command needs beyond the UserOperation itself is provided via
//! CLI flags: the RPC endpoint and block to trace against, where ABIs are
//! cached and looked up, and the simulator link base.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::Address;
use thiserror::Error;
use url::Url;

use crate::abi::{
    AbiCache, AbiResolver, DEFAULT_LOOKUP_URL, FileStore, KeyValueStore, MemoryStore,
    SourcifyClient, StaticRegistry,
};
use crate::chains::SupportedChain;
use crate::simulation::DEFAULT_SIMULATION_URL;
use crate::trace::{TraceOptions, TraceTarget};

/// Errors that can occur when validating config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default minimum spacing between endpoint validations
const DEFAULT_ENDPOINT_MIN_INTERVAL_MS: u64 = 500;

/// Inspector CLI arguments
///
/// # Example usage:
///
/// ```bash
/// userop-inspector \
///     --rpc-url https://mainnet.base.org \
///     --block 0x1a2b3c \
///     --abi-cache-dir ~/.cache/userop-inspector \
///     --paymaster 0xf5d253b62543c6ef526309d497f619cef95ad430 \
///     trace --file op.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Inspector")]
pub struct InspectorArgs {
    /// JSON-RPC endpoint used for tracing
    #[arg(long = "rpc-url", env = "USEROP_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Chain id used for ABI lookups and simulator links.
    /// Defaults to the chain reported by the RPC, or Base when there is none.
    #[arg(long = "chain-id")]
    pub chain_id: Option<u64>,

    /// Block to trace against: a tag (latest, pending, earliest, safe,
    /// finalized), a decimal number or a 0x-prefixed hex number
    #[arg(long = "block", default_value = "latest")]
    pub block: String,

    /// Directory for the ABI cache. ABIs are only cached in memory when unset.
    #[arg(long = "abi-cache-dir", env = "USEROP_ABI_CACHE_DIR")]
    pub abi_cache_dir: Option<PathBuf>,

    /// Base URL of the verified-contract metadata repository
    #[arg(long = "abi-lookup-url", default_value = DEFAULT_LOOKUP_URL)]
    pub abi_lookup_url: String,

    /// Base URL of the transaction simulator
    #[arg(long = "simulation-url", default_value = DEFAULT_SIMULATION_URL)]
    pub simulation_url: String,

    /// Paymaster addresses to decode with the bundled v0.6 paymaster ABI.
    /// Can be specified multiple times.
    #[arg(long = "paymaster")]
    pub paymasters: Vec<String>,

    /// Timeout for each network request, in seconds
    #[arg(long = "request-timeout-secs", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Trace with the sender and zero address holding an unlimited balance
    #[arg(long = "override-balances", default_value = "false")]
    pub override_balances: bool,

    /// Minimum spacing between RPC endpoint validations, in milliseconds
    #[arg(long = "endpoint-min-interval-ms", default_value_t = DEFAULT_ENDPOINT_MIN_INTERVAL_MS)]
    pub endpoint_min_interval_ms: u64,
}

impl Default for InspectorArgs {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: None,
            block: "latest".to_string(),
            abi_cache_dir: None,
            abi_lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            simulation_url: DEFAULT_SIMULATION_URL.to_string(),
            paymasters: vec![],
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            override_balances: false,
            endpoint_min_interval_ms: DEFAULT_ENDPOINT_MIN_INTERVAL_MS,
        }
    }
}

/// Parse a block tag, decimal number or hex number
pub fn parse_block_id(spec: &str) -> Result<BlockId, ConfigError> {
    let spec = spec.trim();
    if let Ok(number) = spec.parse::<u64>() {
        return Ok(BlockId::Number(BlockNumberOrTag::Number(number)));
    }

    BlockNumberOrTag::from_str(spec)
        .map(BlockId::Number)
        .map_err(|e| ConfigError::ValidationError(format!("Invalid block '{spec}': {e}")))
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl { url: url.to_string(), reason: e.to_string() })
}

impl InspectorArgs {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rpc_url) = &self.rpc_url {
            if rpc_url.trim().is_empty() {
                return Err(ConfigError::ValidationError("--rpc-url cannot be empty".to_string()));
            }
            parse_url(rpc_url)?;
        }

        self.chain()?;
        self.block_id()?;
        self.lookup_url()?;
        self.simulation_url()?;
        self.paymasters()?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "--request-timeout-secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Configured RPC URL, required by tracing
    pub fn rpc_url(&self) -> Result<&str, ConfigError> {
        self.rpc_url.as_deref().ok_or_else(|| {
            ConfigError::ValidationError("--rpc-url is required for tracing".to_string())
        })
    }

    /// Explicitly configured chain, if any
    pub fn chain(&self) -> Result<Option<SupportedChain>, ConfigError> {
        self.chain_id
            .map(SupportedChain::try_from)
            .transpose()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Block to trace against
    pub fn block_id(&self) -> Result<BlockId, ConfigError> {
        parse_block_id(&self.block)
    }

    /// ABI lookup base URL
    pub fn lookup_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.abi_lookup_url)
    }

    /// Simulator base URL
    pub fn simulation_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.simulation_url)
    }

    /// Paymaster addresses for the static registry
    pub fn paymasters(&self) -> Result<Vec<Address>, ConfigError> {
        self.paymasters
            .iter()
            .map(|p| {
                Address::from_str(p).map_err(|e| {
                    ConfigError::ValidationError(format!("Invalid paymaster address '{p}': {e}"))
                })
            })
            .collect()
    }

    /// Per-request network timeout
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Minimum spacing between endpoint validations
    pub const fn endpoint_min_interval(&self) -> Duration {
        Duration::from_millis(self.endpoint_min_interval_ms)
    }

    /// Trace settings for `target`
    pub fn trace_options(&self, target: TraceTarget) -> Result<TraceOptions, ConfigError> {
        Ok(TraceOptions { block: self.block_id()?, target, override_balances: self.override_balances })
    }

    /// Build the ABI resolver: bundled ABIs, the cache and the lookup service
    pub fn resolver(&self) -> Result<AbiResolver, ConfigError> {
        let store: Arc<dyn KeyValueStore> = match &self.abi_cache_dir {
            Some(dir) => Arc::new(FileStore::new(dir.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        let lookup = SourcifyClient::new(self.lookup_url()?, self.request_timeout())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(AbiResolver::new(StaticRegistry::v06(self.paymasters()?))
            .with_cache(AbiCache::new(store))
            .with_lookup(Arc::new(lookup)))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        args: InspectorArgs,
    }

    #[test]
    fn test_default_config_validates() {
        let args = InspectorArgs::default();
        assert!(args.validate().is_ok());
        assert_eq!(args.block_id().unwrap(), BlockId::Number(BlockNumberOrTag::Latest));
        assert_eq!(args.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_clap_defaults_match_default_impl() {
        let cli = TestCli::try_parse_from(["userop-inspector"]).unwrap();
        assert_eq!(cli.args, InspectorArgs::default());
    }

    #[test]
    fn test_clap_parses_flags() {
        let cli = TestCli::try_parse_from([
            "userop-inspector",
            "--rpc-url",
            "http://localhost:8545",
            "--chain-id",
            "84532",
            "--block",
            "123",
            "--paymaster",
            "0xf5d253b62543c6ef526309d497f619cef95ad430",
            "--paymaster",
            "0x2faeb0760d4230ef2ac21496bb4f0b47d634fd4c",
            "--override-balances",
        ])
        .unwrap();

        let args = cli.args;
        assert!(args.validate().is_ok());
        assert_eq!(args.rpc_url().unwrap(), "http://localhost:8545");
        assert_eq!(args.chain().unwrap(), Some(SupportedChain::BaseSepolia));
        assert_eq!(args.block_id().unwrap(), BlockId::number(123));
        assert_eq!(args.paymasters().unwrap().len(), 2);

        let options = args.trace_options(TraceTarget::HandleOps).unwrap();
        assert!(options.override_balances);
        assert_eq!(options.target, TraceTarget::HandleOps);
    }

    #[rstest]
    #[case("latest", BlockId::Number(BlockNumberOrTag::Latest))]
    #[case("finalized", BlockId::Number(BlockNumberOrTag::Finalized))]
    #[case("safe", BlockId::Number(BlockNumberOrTag::Safe))]
    #[case("0x10", BlockId::number(16))]
    #[case("16", BlockId::number(16))]
    fn test_block_specs(#[case] spec: &str, #[case] expected: BlockId) {
        assert_eq!(parse_block_id(spec).unwrap(), expected);
    }

    #[test]
    fn test_invalid_block_fails() {
        let args = InspectorArgs { block: "yesterday".to_string(), ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_url_fails() {
        let args = InspectorArgs { rpc_url: Some("not-a-valid-url".to_string()), ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::InvalidUrl { .. })));

        let args = InspectorArgs { abi_lookup_url: "::".to_string(), ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_empty_rpc_url_fails() {
        let args = InspectorArgs { rpc_url: Some(" ".to_string()), ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unsupported_chain_fails() {
        let args = InspectorArgs { chain_id: Some(5), ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_paymaster_fails() {
        let args = InspectorArgs { paymasters: vec!["0x1234".to_string()], ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let args = InspectorArgs { request_timeout_secs: 0, ..Default::default() };
        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_rpc_url_for_tracing() {
        assert!(matches!(InspectorArgs::default().rpc_url(), Err(ConfigError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_resolver_includes_configured_paymasters() {
        let paymaster = "0xf5d253b62543c6ef526309d497f619cef95ad430";
        let args = InspectorArgs { paymasters: vec![paymaster.to_string()], ..Default::default() };

        let resolver = args.resolver().unwrap();
        let resolved = resolver.resolve(paymaster.parse().unwrap(), 8453).await.unwrap();
        assert!(resolved.abi.function("postOp").is_some());
    }
}
