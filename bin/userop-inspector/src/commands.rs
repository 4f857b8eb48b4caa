//! Subcommand implementations.

use std::sync::Arc;

use eyre::WrapErr;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use userop_inspector::{
    CallTreeDecoder, EndpointValidator, InspectorArgs, SupportedChain, TraceRequestor,
    UserOperation, build_simulation_link, render_tree,
};

use crate::cli::{InputArgs, trace_target};

/// Read and parse the operation, filling an empty signature with a placeholder
pub(crate) async fn read_operation(input: &InputArgs) -> eyre::Result<UserOperation> {
    let raw = match &input.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await.wrap_err("Failed to read stdin")?;
            raw
        }
    };

    let mut op = UserOperation::parse(&raw)?;
    if let Some(notice) = op.apply_placeholder_signature(input.placeholder()) {
        eprintln!("{notice}");
    }
    Ok(op)
}

/// Chain id from `--chain-id`, then the RPC endpoint, then Base
pub(crate) async fn resolve_chain_id(args: &InspectorArgs) -> eyre::Result<u64> {
    if let Some(chain) = args.chain()? {
        return Ok(chain.id());
    }
    match args.rpc_url.as_deref() {
        Some(rpc_url) => validate_endpoint(args, rpc_url).await,
        None => Ok(SupportedChain::default().id()),
    }
}

async fn validate_endpoint(args: &InspectorArgs, rpc_url: &str) -> eyre::Result<u64> {
    let validator = EndpointValidator::new(args.endpoint_min_interval(), args.request_timeout());
    Ok(validator.validate(rpc_url).await?)
}

/// Header line for rendered output traced with a synthetic signature
pub(crate) fn placeholder_banner(op: &UserOperation) -> Option<String> {
    op.placeholder_signature().map(|placeholder| {
        format!("signature: synthetic {} placeholder, not signed by the account", placeholder.name())
    })
}

pub(crate) async fn parse(input: InputArgs) -> eyre::Result<()> {
    let op = read_operation(&input).await?;
    println!("{}", serde_json::to_string_pretty(&op.annotated())?);
    Ok(())
}

pub(crate) async fn encode(input: InputArgs, handle_ops: bool) -> eyre::Result<()> {
    let op = read_operation(&input).await?;
    println!("{}", trace_target(handle_ops).calldata(&op)?);
    Ok(())
}

pub(crate) async fn link(args: &InspectorArgs, input: InputArgs) -> eyre::Result<()> {
    let op = read_operation(&input).await?;
    let chain_id = resolve_chain_id(args).await?;
    println!("{}", build_simulation_link(&args.simulation_url()?, chain_id, &op)?);
    Ok(())
}

pub(crate) async fn trace(
    args: &InspectorArgs,
    input: InputArgs,
    handle_ops: bool,
    raw: bool,
    json: bool,
) -> eyre::Result<()> {
    let op = read_operation(&input).await?;
    let rpc_url = args.rpc_url()?;

    // The endpoint is checked even when the chain is given explicitly
    let rpc_chain_id = validate_endpoint(args, rpc_url).await?;
    let chain_id = match args.chain()? {
        Some(chain) if chain.id() != rpc_chain_id => {
            warn!(
                target: "userop-inspector",
                configured = chain.id(),
                rpc = rpc_chain_id,
                "Configured chain differs from the RPC endpoint's chain"
            );
            chain.id()
        }
        Some(chain) => chain.id(),
        None => rpc_chain_id,
    };

    let requestor = TraceRequestor::new(rpc_url, args.request_timeout())?;
    let mut tree = requestor.trace(&op, &args.trace_options(trace_target(handle_ops))?).await?;
    info!(target: "userop-inspector", nodes = tree.node_count(), chain_id, "Traced operation");

    if !raw {
        let decoder = CallTreeDecoder::new(Arc::new(args.resolver()?));
        tree = decoder.decorate(tree, chain_id).await;
    }

    if json {
        let output = serde_json::json!({ "userOperation": op.annotated(), "trace": tree });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if let Some(banner) = placeholder_banner(&op) {
            println!("{banner}");
        }
        print!("{}", render_tree(&tree));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use userop_inspector::SignaturePlaceholder;

    use super::*;

    fn op_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_read_operation_applies_placeholder() {
        let file = op_file(r#"{"sender":"0x1306b01bc3e4ad202612d3843387e94737673f53","nonce":"0x1"}"#);
        let input = InputArgs { file: Some(file.path().to_path_buf()), ecdsa: true };

        let op = read_operation(&input).await.unwrap();
        assert_eq!(op.placeholder_signature(), Some(SignaturePlaceholder::Ecdsa));
    }

    #[tokio::test]
    async fn test_banner_only_for_placeholder() {
        let file = op_file(r#"{"sender":"0x1306b01bc3e4ad202612d3843387e94737673f53"}"#);
        let input = InputArgs { file: Some(file.path().to_path_buf()), ecdsa: false };
        let op = read_operation(&input).await.unwrap();
        assert!(op.has_placeholder_signature());
        assert!(placeholder_banner(&op).unwrap().contains("synthetic passkey placeholder"));

        let signed = op_file(
            r#"{"sender":"0x1306b01bc3e4ad202612d3843387e94737673f53","signature":"0x1234"}"#,
        );
        let input = InputArgs { file: Some(signed.path().to_path_buf()), ecdsa: false };
        let op = read_operation(&input).await.unwrap();
        assert_eq!(placeholder_banner(&op), None);
    }

    #[tokio::test]
    async fn test_read_operation_rejects_invalid_json() {
        let file = op_file("{not json");
        let input = InputArgs { file: Some(file.path().to_path_buf()), ecdsa: false };
        assert!(read_operation(&input).await.is_err());
    }

    #[tokio::test]
    async fn test_read_operation_missing_file() {
        let input = InputArgs { file: Some("/nonexistent/op.json".into()), ecdsa: false };
        let err = read_operation(&input).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_chain_id_prefers_flag() {
        let args = InspectorArgs { chain_id: Some(84532), ..Default::default() };
        assert_eq!(resolve_chain_id(&args).await.unwrap(), 84532);
    }

    #[tokio::test]
    async fn test_chain_id_defaults_to_base() {
        assert_eq!(resolve_chain_id(&InspectorArgs::default()).await.unwrap(), 8453);
    }
}
