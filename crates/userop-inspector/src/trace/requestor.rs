//! `debug_traceCall` against the EntryPoint.

use std::time::Duration;

use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::Bytes;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_rpc_types_eth::state::{AccountOverride, StateOverride};
use alloy_rpc_types_trace::geth::{
    CallFrame, GethDebugBuiltInTracerType, GethDebugTracerType, GethDebugTracingCallOptions,
    GethDebugTracingOptions,
};
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use reqwest::Client;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::CallTraceNode;
use crate::contracts::{ENTRYPOINT_V06_ADDRESS, OVERRIDE_BALANCE, UserOperationV06Packed, ZERO_ADDRESS};
use crate::encoding::{EncodeError, encode_handle_op, encode_simulate_handle_op};
use crate::userop::UserOperation;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// Default per-request timeout
pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from a trace request
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Invalid RPC endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("RPC endpoint does not support the callTracer: {0}")]
    UnsupportedTracer(String),

    #[error("Trace request failed: {0}")]
    Transport(TransportError),

    #[error("Failed to encode UserOperation: {0}")]
    Encode(#[from] EncodeError),

    #[error("Timeout on trace request after {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for TraceError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            if payload.code == METHOD_NOT_FOUND || payload.message.to_lowercase().contains("tracer")
            {
                return Self::UnsupportedTracer(payload.message.to_string());
            }
        }
        Self::Transport(err)
    }
}

/// EntryPoint call to trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceTarget {
    /// `simulateHandleOp(op, target, targetCallData)`
    #[default]
    SimulateHandleOp,
    /// `handleOps([op], address(0))`
    HandleOps,
}

impl TraceTarget {
    /// Calldata for this target
    pub fn calldata(self, op: &UserOperation) -> Result<Bytes, EncodeError> {
        match self {
            Self::SimulateHandleOp => encode_simulate_handle_op(op),
            Self::HandleOps => encode_handle_op(op),
        }
    }
}

/// Per-request trace settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceOptions {
    /// Block to execute against
    pub block: BlockId,
    /// EntryPoint function to call
    pub target: TraceTarget,
    /// Give the sender and the zero address an effectively unlimited balance
    pub override_balances: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            block: BlockId::Number(BlockNumberOrTag::Latest),
            target: TraceTarget::default(),
            override_balances: false,
        }
    }
}

/// Issues `debug_traceCall` with the built-in `callTracer`
///
/// One request per trace; failures are returned to the caller without retry.
#[derive(Clone)]
pub struct TraceRequestor {
    provider: RootProvider,
    timeout: Duration,
}

impl std::fmt::Debug for TraceRequestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceRequestor").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}

impl TraceRequestor {
    /// Requestor for the HTTP endpoint at `rpc_url`
    pub fn new(rpc_url: &str, request_timeout: Duration) -> Result<Self, TraceError> {
        let endpoint = parse_endpoint(rpc_url)?;
        let client = Client::builder().timeout(request_timeout).build().map_err(|e| {
            TraceError::InvalidEndpoint {
                url: rpc_url.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            }
        })?;

        let http = Http::with_client(client, endpoint);
        let provider = RootProvider::new(RpcClient::new(http, false));
        Ok(Self { provider, timeout: request_timeout })
    }

    /// Requestor over an existing provider
    pub const fn with_provider(provider: RootProvider, request_timeout: Duration) -> Self {
        Self { provider, timeout: request_timeout }
    }

    /// Trace `op` through the EntryPoint and return the raw call tree
    pub async fn trace(
        &self,
        op: &UserOperation,
        options: &TraceOptions,
    ) -> Result<CallTraceNode, TraceError> {
        let data = options.target.calldata(op)?;
        let state_overrides =
            if options.override_balances { Some(balance_overrides(op)?) } else { None };

        let tx = TransactionRequest::default()
            .from(ZERO_ADDRESS)
            .to(ENTRYPOINT_V06_ADDRESS)
            .input(data.into());
        let tracing_opts = GethDebugTracingCallOptions {
            tracing_options: GethDebugTracingOptions {
                tracer: Some(GethDebugTracerType::BuiltInTracer(
                    GethDebugBuiltInTracerType::CallTracer,
                )),
                ..Default::default()
            },
            state_overrides,
            ..Default::default()
        };

        info!(
            target: "userop-trace",
            sender = %op.sender(),
            block = ?options.block,
            trace_target = ?options.target,
            override_balances = options.override_balances,
            "Requesting debug_traceCall"
        );

        let result = timeout(
            self.timeout,
            self.provider.client().request::<_, CallFrame>(
                "debug_traceCall",
                (tx, options.block, tracing_opts),
            ),
        )
        .await;

        let frame = match result {
            Err(_) => {
                warn!(target: "userop-trace", timeout = ?self.timeout, "debug_traceCall timed out");
                return Err(TraceError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                let err = TraceError::from(e);
                warn!(target: "userop-trace", error = %err, "debug_traceCall failed");
                return Err(err);
            }
            Ok(Ok(frame)) => frame,
        };

        let tree = CallTraceNode::from(frame);
        debug!(target: "userop-trace", nodes = tree.node_count(), "debug_traceCall completed");
        Ok(tree)
    }
}

/// Validate an RPC URL for use as an HTTP transport
pub(crate) fn parse_endpoint(rpc_url: &str) -> Result<Url, TraceError> {
    let invalid = |reason: String| TraceError::InvalidEndpoint { url: rpc_url.to_string(), reason };

    let url = Url::parse(rpc_url.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

fn balance_overrides(op: &UserOperation) -> Result<StateOverride, EncodeError> {
    let sender = UserOperationV06Packed::try_from(op)?.sender;
    let account = AccountOverride { balance: Some(OVERRIDE_BALANCE), ..Default::default() };

    let mut overrides = StateOverride::default();
    overrides.insert(sender, account.clone());
    overrides.insert(ZERO_ADDRESS, account);
    Ok(overrides)
}

/// Trace the `simulateHandleOp` call for `op` at `block` (latest when `None`)
pub async fn trace_simulation(
    op: &UserOperation,
    rpc_url: &str,
    block: Option<BlockId>,
) -> Result<CallTraceNode, TraceError> {
    let requestor = TraceRequestor::new(rpc_url, DEFAULT_TRACE_TIMEOUT)?;
    let options = TraceOptions { block: block.unwrap_or_default(), ..Default::default() };
    requestor.trace(op, &options).await
}
