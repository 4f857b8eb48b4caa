//! Human-readable rendering of decoded values and call trees.

use std::fmt::Write as _;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::hex;

use super::CallTraceNode;

/// Render `name(arg1, arg2, ...)`
pub fn format_call(name: &str, values: &[DynSolValue]) -> String {
    let args: Vec<String> = values.iter().map(format_value).collect();
    format!("{name}({})", args.join(", "))
}

/// Default string form of a decoded ABI value
///
/// Addresses are checksummed, integers are decimal, byte strings are `0x` hex
/// and strings are printed without quotes.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..(*size).min(32)]),
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Function(function) => hex::encode_prefixed(function.as_slice()),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            let fields: Vec<String> = fields.iter().map(format_value).collect();
            format!("({})", fields.join(", "))
        }
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

/// Indented multi-line view of a call tree
pub fn render_tree(root: &CallTraceNode) -> String {
    let mut out = String::new();
    render_node(&mut out, root, 0);
    out
}

fn render_node(out: &mut String, node: &CallTraceNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let call_type = node.call_type.as_deref().unwrap_or("CALL");
    let to = node.to.map(|to| to.to_checksum(None)).unwrap_or_else(|| "CREATE".to_string());
    let status = if node.failed() { "REVERT" } else { "OK" };

    let _ = writeln!(out, "{indent}{call_type} {} -> {to} [{status}]", node.from.to_checksum(None));

    let input = node.decoded_input.clone().unwrap_or_else(|| node.input.to_string());
    let _ = writeln!(out, "{indent}  input:  {input}");

    let output = node
        .decoded_output
        .clone()
        .or_else(|| node.output.as_ref().map(ToString::to_string));
    if let Some(output) = output {
        let _ = writeln!(out, "{indent}  output: {output}");
    }
    if let Some(error) = &node.error {
        let _ = writeln!(out, "{indent}  error:  {error}");
    }
    if let Some(reason) = &node.revert_reason {
        let _ = writeln!(out, "{indent}  revert: {reason}");
    }

    for child in &node.calls {
        render_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256, Bytes, I256, U256, address};

    use super::*;

    #[test]
    fn test_format_scalar_values() {
        assert_eq!(format_value(&DynSolValue::Uint(U256::from(1_000_000u64), 256)), "1000000");
        assert_eq!(format_value(&DynSolValue::Int(I256::try_from(-5i64).unwrap(), 256)), "-5");
        assert_eq!(format_value(&DynSolValue::Bool(true)), "true");
        assert_eq!(format_value(&DynSolValue::String("hello".into())), "hello");
        assert_eq!(format_value(&DynSolValue::Bytes(vec![0xde, 0xad])), "0xdead");
        assert_eq!(
            format_value(&DynSolValue::Address(address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"))),
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
        );
        assert_eq!(format_value(&DynSolValue::FixedBytes(B256::repeat_byte(0xab), 2)), "0xabab");
    }

    #[test]
    fn test_format_nested_values() {
        let value = DynSolValue::Tuple(vec![
            DynSolValue::Array(vec![
                DynSolValue::Uint(U256::from(1), 8),
                DynSolValue::Uint(U256::from(2), 8),
            ]),
            DynSolValue::Bool(false),
        ]);
        assert_eq!(format_value(&value), "([1, 2], false)");
        assert_eq!(
            format_call("transfer", &[DynSolValue::Address(Address::ZERO), DynSolValue::Uint(U256::from(7), 256)]),
            "transfer(0x0000000000000000000000000000000000000000, 7)"
        );
    }

    #[test]
    fn test_render_tree_indents_children() {
        let tree = CallTraceNode {
            to: Some(Address::ZERO),
            input: Bytes::from_static(&[0x12, 0x34]),
            decoded_input: Some("ping()".to_string()),
            calls: vec![CallTraceNode {
                error: Some("execution reverted".to_string()),
                call_type: Some("STATICCALL".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let rendered = render_tree(&tree);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("CALL 0x0000"));
        assert!(lines[0].ends_with("[OK]"));
        assert_eq!(lines[1], "  input:  ping()");
        assert!(lines[2].starts_with("  STATICCALL"));
        assert!(lines[2].ends_with("-> CREATE [REVERT]"));
        assert_eq!(lines[3], "    input:  0x");
        assert_eq!(lines[4], "    error:  execution reverted");
    }
}
