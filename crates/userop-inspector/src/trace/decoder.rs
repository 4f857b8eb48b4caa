//! Best-effort decoding of call-tree inputs and outputs.
//!
//! Each node's bytes are matched against the ABI resolved for its callee. A
//! node that cannot be decoded keeps its raw hex as the decoded label, and a
//! failure on one node never affects any other.

use std::sync::Arc;

use alloy_dyn_abi::{FunctionExt, JsonAbiExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Bytes, Selector};
use alloy_sol_types::{Revert, SolError};
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use thiserror::Error;
use tracing::{debug, trace};

use super::CallTraceNode;
use super::render::format_call;
use crate::abi::AbiResolver;

/// Why a field fell back to raw hex
#[derive(Debug, Error)]
enum DecodeFailure {
    #[error("no ABI for callee")]
    NoAbi,

    #[error("data shorter than a selector")]
    TooShort,

    #[error("selector {0} not in ABI")]
    UnknownSelector(Selector),

    #[error("function declares no outputs")]
    NoOutputs,

    #[error(transparent)]
    Abi(#[from] alloy_dyn_abi::Error),

    #[error("invalid revert string: {0}")]
    Revert(#[from] alloy_sol_types::Error),
}

fn selector_of(data: &[u8]) -> Result<Selector, DecodeFailure> {
    data.get(..4).map(Selector::from_slice).ok_or(DecodeFailure::TooShort)
}

fn decode_input(abi: Option<&JsonAbi>, input: &[u8]) -> Result<String, DecodeFailure> {
    let abi = abi.ok_or(DecodeFailure::NoAbi)?;
    let selector = selector_of(input)?;
    let function = abi
        .functions()
        .find(|f| f.selector() == selector)
        .ok_or(DecodeFailure::UnknownSelector(selector))?;

    let values = function.abi_decode_input(&input[4..])?;
    Ok(format_call(&function.name, &values))
}

/// Reverted frames try custom errors before return values, since an error
/// payload can also parse as a function's outputs.
fn decode_output(
    abi: Option<&JsonAbi>,
    input: &[u8],
    output: &[u8],
    reverted: bool,
) -> Result<String, DecodeFailure> {
    if output.starts_with(&Revert::SELECTOR) {
        let revert = Revert::abi_decode(output)?;
        return Ok(format!("Error: {}", revert.reason));
    }

    let abi = abi.ok_or(DecodeFailure::NoAbi)?;
    if reverted {
        decode_error(abi, output).or_else(|_| decode_function_output(abi, input, output))
    } else {
        decode_function_output(abi, input, output).or_else(|_| decode_error(abi, output))
    }
}

fn decode_function_output(
    abi: &JsonAbi,
    input: &[u8],
    output: &[u8],
) -> Result<String, DecodeFailure> {
    let selector = selector_of(input)?;
    let function = abi
        .functions()
        .find(|f| f.selector() == selector)
        .ok_or(DecodeFailure::UnknownSelector(selector))?;

    let values = function.abi_decode_output(output)?;
    if values.is_empty() {
        return Err(DecodeFailure::NoOutputs);
    }
    Ok(format_call(&function.name, &values))
}

fn decode_error(abi: &JsonAbi, output: &[u8]) -> Result<String, DecodeFailure> {
    let selector = selector_of(output)?;
    let error = abi
        .errors()
        .find(|e| e.selector() == selector)
        .ok_or(DecodeFailure::UnknownSelector(selector))?;

    let values = error.abi_decode_input(&output[4..])?;
    Ok(format_call(&error.name, &values))
}

/// Only a revert string decodes without an ABI
fn output_needs_abi(output: Option<&Bytes>) -> bool {
    output.is_some_and(|out| !out.is_empty() && !out.starts_with(&Revert::SELECTOR))
}

/// Decorates call trees with decoded labels
#[derive(Debug, Clone)]
pub struct CallTreeDecoder {
    resolver: Arc<AbiResolver>,
}

impl CallTreeDecoder {
    /// Decoder resolving callee ABIs through `resolver`
    pub const fn new(resolver: Arc<AbiResolver>) -> Self {
        Self { resolver }
    }

    /// Fill `decoded_input` and `decoded_output` on every node of `tree`
    ///
    /// Raw fields and tree shape are preserved. Sibling subtrees are decoded
    /// concurrently; all use the same `chain_id`.
    pub async fn decorate(&self, tree: CallTraceNode, chain_id: u64) -> CallTraceNode {
        let decorated = self.decorate_node(tree, chain_id).await;
        debug!(target: "userop-trace", nodes = decorated.node_count(), chain_id, "Decoded call tree");
        decorated
    }

    fn decorate_node(&self, mut node: CallTraceNode, chain_id: u64) -> BoxFuture<'_, CallTraceNode> {
        async move {
            self.decode_fields(&mut node, chain_id).await;

            let children = std::mem::take(&mut node.calls);
            node.calls =
                join_all(children.into_iter().map(|child| self.decorate_node(child, chain_id)))
                    .await;
            node
        }
        .boxed()
    }

    async fn decode_fields(&self, node: &mut CallTraceNode, chain_id: u64) {
        let needs_abi = !node.input.is_empty() || output_needs_abi(node.output.as_ref());
        let abi = match node.to {
            Some(to) if needs_abi => self.resolver.resolve(to, chain_id).await.map(|r| r.abi),
            _ => None,
        };

        node.decoded_input = Some(if node.input.is_empty() {
            node.input.to_string()
        } else {
            decode_input(abi.as_deref(), &node.input).unwrap_or_else(|e| {
                trace!(target: "userop-trace", to = ?node.to, reason = %e, "Input left raw");
                node.input.to_string()
            })
        });

        let reverted = node.failed();
        node.decoded_output = node.output.as_ref().map(|output| {
            if output.is_empty() {
                return output.to_string();
            }
            decode_output(abi.as_deref(), &node.input, output, reverted).unwrap_or_else(|e| {
                trace!(target: "userop-trace", to = ?node.to, reason = %e, "Output left raw");
                output.to_string()
            })
        });
    }
}
