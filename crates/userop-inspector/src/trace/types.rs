use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_trace::geth::CallFrame;
use serde::{Deserialize, Serialize};

/// One frame of a `callTracer` call tree
///
/// Raw fields mirror the node's response; `decoded_input` and
/// `decoded_output` are filled in by [`CallTreeDecoder`](super::CallTreeDecoder)
/// and never replace the raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTraceNode {
    /// Caller
    pub from: Address,
    /// Callee, absent for a failed create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Calldata
    #[serde(default)]
    pub input: Bytes,
    /// Returndata or revert data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Bytes>,
    /// Execution error reported by the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Revert reason the node already decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    /// CALL, DELEGATECALL, STATICCALL, CREATE, ...
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    /// Gas made available to the frame
    #[serde(default)]
    pub gas: U256,
    /// Gas consumed by the frame
    #[serde(default)]
    pub gas_used: U256,
    /// Wei transferred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Sub-calls in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallTraceNode>,
    /// `name(args)` rendering of `input`, or the raw hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_input: Option<String>,
    /// Decoded return value or error, or the raw hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_output: Option<String>,
}

impl CallTraceNode {
    /// Number of nodes in the tree rooted here
    pub fn node_count(&self) -> usize {
        1 + self.calls.iter().map(Self::node_count).sum::<usize>()
    }

    /// Returns true if the frame reverted or errored
    pub const fn failed(&self) -> bool {
        self.error.is_some() || self.revert_reason.is_some()
    }
}

impl From<CallFrame> for CallTraceNode {
    fn from(frame: CallFrame) -> Self {
        Self {
            from: frame.from,
            to: frame.to,
            input: frame.input,
            output: frame.output,
            error: frame.error,
            revert_reason: frame.revert_reason,
            call_type: (!frame.typ.is_empty()).then_some(frame.typ),
            gas: frame.gas,
            gas_used: frame.gas_used,
            value: frame.value,
            calls: frame.calls.into_iter().map(Self::from).collect(),
            decoded_input: None,
            decoded_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_frame() -> serde_json::Value {
        json!({
            "from": "0x0000000000000000000000000000000000000000",
            "to": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
            "gas": "0x1c9c380",
            "gasUsed": "0x2a4b1",
            "input": "0xd6383f94",
            "output": "0x",
            "error": "execution reverted",
            "type": "CALL",
            "value": "0x0",
            "calls": [
                {
                    "from": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
                    "to": "0x1306b01bc3e4ad202612d3843387e94737673f53",
                    "gas": "0x1000",
                    "gasUsed": "0x100",
                    "input": "0x3a871cdd",
                    "output": "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "type": "CALL"
                },
                {
                    "from": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
                    "to": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
                    "gas": "0x1000",
                    "gasUsed": "0x100",
                    "input": "0x1d732756",
                    "type": "CALL",
                    "calls": [
                        {
                            "from": "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789",
                            "to": "0x1306b01bc3e4ad202612d3843387e94737673f53",
                            "gas": "0x10",
                            "gasUsed": "0x1",
                            "input": "0x",
                            "type": "STATICCALL"
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_call_frame_conversion_keeps_structure() {
        let frame: CallFrame = serde_json::from_value(sample_frame()).unwrap();
        let node = CallTraceNode::from(frame);

        assert_eq!(node.node_count(), 4);
        assert_eq!(node.call_type.as_deref(), Some("CALL"));
        assert!(node.failed());
        assert_eq!(node.calls[1].calls[0].call_type.as_deref(), Some("STATICCALL"));
        assert_eq!(node.calls[0].input, Bytes::from_static(&[0x3a, 0x87, 0x1c, 0xdd]));
        assert!(node.decoded_input.is_none());
    }

    #[test]
    fn test_node_deserializes_from_tracer_json() {
        let node: CallTraceNode = serde_json::from_value(sample_frame()).unwrap();
        let via_frame = CallTraceNode::from(serde_json::from_value::<CallFrame>(sample_frame()).unwrap());
        assert_eq!(node, via_frame);
    }

    #[test]
    fn test_serializes_camel_case() {
        let node = CallTraceNode {
            revert_reason: Some("AA23 reverted".to_string()),
            decoded_input: Some("0x".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["revertReason"], "AA23 reverted");
        assert_eq!(value["decodedInput"], "0x");
        assert!(value.get("calls").is_none());
    }
}
