//! Deep links into the Tenderly transaction simulator.

use url::Url;

use crate::contracts::ENTRYPOINT_V06_ADDRESS;
use crate::encoding::{EncodeError, encode_simulate_handle_op};
use crate::userop::UserOperation;

/// Default simulator page
pub const DEFAULT_SIMULATION_URL: &str = "https://dashboard.tenderly.co/chunter/alert/simulator/new";

/// Simulator link for `op`'s `simulateHandleOp` call on `chain_id`
///
/// Query parameters carry the raw calldata, a zero value, the EntryPoint
/// address and the chain id. No network access.
pub fn build_simulation_link(
    base_url: &Url,
    chain_id: u64,
    op: &UserOperation,
) -> Result<Url, EncodeError> {
    let calldata = encode_simulate_handle_op(op)?;

    let mut url = base_url.clone();
    url.query_pairs_mut()
        .append_pair("rawFunctionInput", &calldata.to_string())
        .append_pair("value", "0")
        .append_pair("contractAddress", &ENTRYPOINT_V06_ADDRESS.to_checksum(None))
        .append_pair("network", &chain_id.to_string());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn op() -> UserOperation {
        let raw = json!({
            "sender": "0x1306b01bc3e4ad202612d3843387e94737673f53",
            "nonce": "0x1",
            "callData": "0xb61d27f6"
        });
        UserOperation::parse(&raw.to_string()).unwrap()
    }

    #[test]
    fn test_link_carries_calldata_and_entrypoint() {
        let base = Url::parse(DEFAULT_SIMULATION_URL).unwrap();
        let link = build_simulation_link(&base, 8453, &op()).unwrap();

        assert_eq!(link.path(), "/chunter/alert/simulator/new");
        let params: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        let calldata = encode_simulate_handle_op(&op()).unwrap().to_string();
        assert_eq!(
            params,
            vec![
                ("rawFunctionInput".to_string(), calldata.clone()),
                ("value".to_string(), "0".to_string()),
                (
                    "contractAddress".to_string(),
                    "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".to_string()
                ),
                ("network".to_string(), "8453".to_string()),
            ]
        );
        assert!(link.as_str().contains(&format!("rawFunctionInput={calldata}")));
    }

    #[test]
    fn test_link_is_deterministic() {
        let base = Url::parse(DEFAULT_SIMULATION_URL).unwrap();
        assert_eq!(
            build_simulation_link(&base, 1, &op()).unwrap(),
            build_simulation_link(&base, 1, &op()).unwrap()
        );
    }
}
