//! Three-tier ABI resolution: static registry, cache, remote lookup.

use std::sync::Arc;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use tracing::{debug, warn};

use super::cache::{AbiCache, CacheLookup};
use super::lookup::AbiLookup;
use super::registry::StaticRegistry;

/// Where a resolved ABI came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiSource {
    /// Bundled with the binary
    Static,
    /// Fresh cache record
    Cache,
    /// Fetched from the lookup service during this call
    Remote,
}

/// An ABI bound to the address it was resolved for
#[derive(Debug, Clone)]
pub struct ResolvedAbi {
    /// Contract interface
    pub abi: Arc<JsonAbi>,
    /// Tier that produced it
    pub source: AbiSource,
}

/// Resolves contract addresses to ABIs, first hit wins
///
/// Failures in the cache or lookup tiers are logged and degrade to a miss;
/// [`AbiResolver::resolve`] never returns an error.
#[derive(Debug, Clone, Default)]
pub struct AbiResolver {
    registry: StaticRegistry,
    cache: Option<AbiCache>,
    lookup: Option<Arc<dyn AbiLookup>>,
}

impl AbiResolver {
    /// Resolver backed only by `registry`
    pub fn new(registry: StaticRegistry) -> Self {
        Self { registry, cache: None, lookup: None }
    }

    /// Add the durable cache tier
    pub fn with_cache(mut self, cache: AbiCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add the remote lookup tier
    pub fn with_lookup(mut self, lookup: Arc<dyn AbiLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Resolve the ABI for `address` on `chain_id`
    pub async fn resolve(&self, address: Address, chain_id: u64) -> Option<ResolvedAbi> {
        if let Some(abi) = self.registry.get(&address) {
            debug!(target: "userop-abi", %address, "Static registry hit");
            return Some(ResolvedAbi { abi, source: AbiSource::Static });
        }

        if let Some(cache) = &self.cache {
            match cache.load(&address).await {
                Ok(CacheLookup::Fresh(abi)) => {
                    debug!(target: "userop-abi", %address, "Cache hit");
                    return Some(ResolvedAbi { abi: Arc::new(abi), source: AbiSource::Cache });
                }
                Ok(CacheLookup::Stale) => {
                    debug!(target: "userop-abi", %address, "Cache record expired");
                }
                Ok(CacheLookup::Missing) => {
                    debug!(target: "userop-abi", %address, "Cache miss");
                }
                Err(e) => {
                    warn!(target: "userop-abi", %address, error = %e, "Failed to read ABI cache");
                }
            }
        }

        let lookup = self.lookup.as_ref()?;
        let abi = match lookup.fetch_abi(chain_id, address).await {
            Ok(abi) => abi,
            Err(e) => {
                debug!(target: "userop-abi", %address, chain_id, error = %e, "Remote ABI lookup failed");
                return None;
            }
        };
        debug!(target: "userop-abi", %address, chain_id, "Fetched ABI from lookup service");

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&address, &abi).await {
                warn!(target: "userop-abi", %address, error = %e, "Failed to write ABI cache");
            }
        }

        Some(ResolvedAbi { abi: Arc::new(abi), source: AbiSource::Remote })
    }
}
