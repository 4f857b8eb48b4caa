//! EntryPoint v0.6 calldata encoding.
//!
//! A [`UserOperation`] keeps its fields as text; the conversion into the
//! [`UserOperationV06Packed`] ABI tuple is where malformed hex surfaces, so it is
//! the only fallible step here.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use thiserror::Error;
use tracing::trace;

use crate::contracts::{IEntryPointV06, UserOperationV06Packed, ZERO_ADDRESS};
use crate::userop::UserOperation;

/// Length of a `0x`-prefixed address in hex characters
const ADDRESS_HEX_LEN: usize = 42;

/// Errors converting a textual UserOperation into ABI values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Invalid address in '{field}': {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Invalid hex quantity in '{field}': {value}")]
    InvalidQuantity { field: &'static str, value: String },

    #[error("Invalid hex bytes in '{field}': {value}")]
    InvalidBytes { field: &'static str, value: String },
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, EncodeError> {
    Address::from_str(value)
        .map_err(|_| EncodeError::InvalidAddress { field, value: value.to_string() })
}

fn parse_quantity(field: &'static str, value: &str) -> Result<U256, EncodeError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| EncodeError::InvalidQuantity { field, value: value.to_string() })
}

fn parse_bytes(field: &'static str, value: &str) -> Result<Bytes, EncodeError> {
    Bytes::from_str(value).map_err(|_| EncodeError::InvalidBytes { field, value: value.to_string() })
}

impl TryFrom<&UserOperation> for UserOperationV06Packed {
    type Error = EncodeError;

    fn try_from(op: &UserOperation) -> Result<Self, Self::Error> {
        Ok(Self {
            sender: parse_address("sender", op.sender())?,
            nonce: parse_quantity("nonce", op.nonce())?,
            initCode: parse_bytes("initCode", op.init_code())?,
            callData: parse_bytes("callData", op.call_data())?,
            callGasLimit: parse_quantity("callGasLimit", op.call_gas_limit())?,
            verificationGasLimit: parse_quantity(
                "verificationGasLimit",
                op.verification_gas_limit(),
            )?,
            preVerificationGas: parse_quantity("preVerificationGas", op.pre_verification_gas())?,
            maxFeePerGas: parse_quantity("maxFeePerGas", op.max_fee_per_gas())?,
            maxPriorityFeePerGas: parse_quantity(
                "maxPriorityFeePerGas",
                op.max_priority_fee_per_gas(),
            )?,
            paymasterAndData: parse_bytes("paymasterAndData", op.paymaster_and_data())?,
            signature: parse_bytes("signature", op.signature())?,
        })
    }
}

/// Post-op target and calldata handed to `simulateHandleOp`
///
/// When `paymasterAndData` holds at least a full address, the address becomes
/// the target and whatever follows it the calldata. Anything shorter yields the
/// zero address with empty calldata.
pub fn post_op_target(op: &UserOperation) -> Result<(Address, Bytes), EncodeError> {
    let paymaster_and_data = op.paymaster_and_data();
    if paymaster_and_data.len() < ADDRESS_HEX_LEN {
        return Ok((ZERO_ADDRESS, Bytes::new()));
    }
    if !paymaster_and_data.is_ascii() {
        return Err(EncodeError::InvalidBytes {
            field: "paymasterAndData",
            value: paymaster_and_data.to_string(),
        });
    }

    let (address, data) = paymaster_and_data.split_at(ADDRESS_HEX_LEN);
    let target = parse_address("paymasterAndData", address)?;
    let target_call_data = parse_bytes("paymasterAndData", &format!("0x{data}"))?;
    Ok((target, target_call_data))
}

/// Calldata for `EntryPoint.simulateHandleOp(op, target, targetCallData)`
pub fn encode_simulate_handle_op(op: &UserOperation) -> Result<Bytes, EncodeError> {
    let packed = UserOperationV06Packed::try_from(op)?;
    let (target, target_call_data) = post_op_target(op)?;

    let call = IEntryPointV06::simulateHandleOpCall {
        op: packed,
        target,
        targetCallData: target_call_data,
    };
    let calldata: Bytes = call.abi_encode().into();
    trace!(target: "userop-encoding", len = calldata.len(), %target, "Encoded simulateHandleOp");
    Ok(calldata)
}

/// Calldata for `EntryPoint.handleOps([op], address(0))`
pub fn encode_handle_op(op: &UserOperation) -> Result<Bytes, EncodeError> {
    let packed = UserOperationV06Packed::try_from(op)?;

    let call = IEntryPointV06::handleOpsCall { ops: vec![packed], beneficiary: ZERO_ADDRESS };
    let calldata: Bytes = call.abi_encode().into();
    trace!(target: "userop-encoding", len = calldata.len(), "Encoded handleOps");
    Ok(calldata)
}
