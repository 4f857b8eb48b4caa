//! Remote lookup of verified contract ABIs.

use std::time::Duration;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Default Sourcify repository root for fully matched contracts
pub const DEFAULT_LOOKUP_URL: &str = "https://repo.sourcify.dev/contracts/full_match";

/// Errors from the remote ABI service
///
/// These never leave the resolver; they are logged and treated as a miss.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("ABI lookup request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ABI lookup returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("ABI lookup base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

/// Source of ABIs for contracts outside the static registry
#[async_trait]
pub trait AbiLookup: Send + Sync + std::fmt::Debug {
    /// Fetch the ABI of `address` on `chain_id`
    async fn fetch_abi(&self, chain_id: u64, address: Address) -> Result<JsonAbi, LookupError>;
}

#[derive(Debug, Deserialize)]
struct ContractMetadata {
    output: MetadataOutput,
}

#[derive(Debug, Deserialize)]
struct MetadataOutput {
    abi: JsonAbi,
}

/// Reads `output.abi` from Sourcify's `metadata.json`
#[derive(Debug, Clone)]
pub struct SourcifyClient {
    client: Client,
    base_url: Url,
}

impl SourcifyClient {
    /// Client for the repository rooted at `base_url`
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, LookupError> {
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/{chain_id}/{checksummed address}/metadata.json`
    pub fn metadata_url(&self, chain_id: u64, address: Address) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([chain_id.to_string(), address.to_checksum(None), "metadata.json".to_string()]);
        Ok(url)
    }
}

#[async_trait]
impl AbiLookup for SourcifyClient {
    async fn fetch_abi(&self, chain_id: u64, address: Address) -> Result<JsonAbi, LookupError> {
        let url = self.metadata_url(chain_id, address)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let metadata: ContractMetadata = response.json().await?;
        Ok(metadata.output.abi)
    }
}
