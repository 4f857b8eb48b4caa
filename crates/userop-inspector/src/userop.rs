//! UserOperation model and JSON parsing.
//!
//! The parser accepts loosely-typed JSON as pasted by a user: either a bare
//! v0.6 UserOperation or an RPC response wrapping one under
//! `request.transaction`. Every field is kept in its textual `0x`-prefixed form
//! so the operation can be echoed back exactly as understood; conversion into
//! ABI types happens in [`crate::encoding`].

use alloy_primitives::{Bytes, U256, hex, uint};
use alloy_sol_types::{SolValue, sol};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Errors produced while parsing a UserOperation
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse UserOperation: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to parse UserOperation: Invalid or missing sender address")]
    InvalidSender,

    #[error("Failed to parse UserOperation: field '{field}' must be a hex string or integer")]
    InvalidField { field: &'static str },
}

/// Textual default for a missing field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Integer fields default to `0x0`
    Quantity,
    /// Byte-string fields default to `0x`
    Bytes,
    /// Required, no default
    Sender,
}

impl FieldKind {
    const fn default_value(self) -> &'static str {
        match self {
            Self::Quantity => "0x0",
            Self::Bytes => "0x",
            Self::Sender => "",
        }
    }
}

/// ERC-4337 v0.6 UserOperation in canonical textual form
///
/// Every field is present and `0x`-prefixed. Instances are only produced by
/// [`UserOperation::parse`]; the signature is the one field that may change
/// afterwards, and only through the placeholder helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    sender: String,
    nonce: String,
    init_code: String,
    call_data: String,
    call_gas_limit: String,
    verification_gas_limit: String,
    pre_verification_gas: String,
    max_fee_per_gas: String,
    max_priority_fee_per_gas: String,
    paymaster_and_data: String,
    signature: String,
}

impl UserOperation {
    /// Parse a UserOperation from JSON text
    ///
    /// Missing fields default to `0x0` (integers) or `0x` (bytes). Integer JSON
    /// values are accepted and rendered as hex quantities.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut parsed: Value = serde_json::from_str(raw)?;

        // Pasted RPC responses carry the operation under request.transaction
        let envelope = parsed
            .pointer_mut("/request/transaction")
            .filter(|tx| is_truthy(tx))
            .map(Value::take);
        if let Some(tx) = envelope {
            parsed = tx;
        }

        let empty = Map::new();
        let source = parsed.as_object().unwrap_or(&empty);

        let mut op = Self {
            sender: read_field(source, "sender", FieldKind::Sender)?,
            nonce: read_field(source, "nonce", FieldKind::Quantity)?,
            init_code: read_field(source, "initCode", FieldKind::Bytes)?,
            call_data: read_field(source, "callData", FieldKind::Bytes)?,
            call_gas_limit: read_field(source, "callGasLimit", FieldKind::Quantity)?,
            verification_gas_limit: read_field(source, "verificationGasLimit", FieldKind::Quantity)?,
            pre_verification_gas: read_field(source, "preVerificationGas", FieldKind::Quantity)?,
            max_fee_per_gas: read_field(source, "maxFeePerGas", FieldKind::Quantity)?,
            max_priority_fee_per_gas: read_field(
                source,
                "maxPriorityFeePerGas",
                FieldKind::Quantity,
            )?,
            paymaster_and_data: read_field(source, "paymasterAndData", FieldKind::Bytes)?,
            signature: read_field(source, "signature", FieldKind::Bytes)?,
        };

        if op.sender.is_empty() || !op.sender.starts_with("0x") {
            return Err(ParseError::InvalidSender);
        }

        for value in op.fields_mut() {
            if !value.starts_with("0x") {
                value.insert_str(0, "0x");
            }
        }

        debug!(target: "userop-encoding", sender = %op.sender, nonce = %op.nonce, "Parsed UserOperation");
        Ok(op)
    }

    fn fields_mut(&mut self) -> [&mut String; 11] {
        [
            &mut self.sender,
            &mut self.nonce,
            &mut self.init_code,
            &mut self.call_data,
            &mut self.call_gas_limit,
            &mut self.verification_gas_limit,
            &mut self.pre_verification_gas,
            &mut self.max_fee_per_gas,
            &mut self.max_priority_fee_per_gas,
            &mut self.paymaster_and_data,
            &mut self.signature,
        ]
    }

    /// Sender account address
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Anti-replay nonce
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Factory address and calldata for account deployment
    pub fn init_code(&self) -> &str {
        &self.init_code
    }

    /// Calldata executed by the account
    pub fn call_data(&self) -> &str {
        &self.call_data
    }

    /// Gas limit for the execution phase
    pub fn call_gas_limit(&self) -> &str {
        &self.call_gas_limit
    }

    /// Gas limit for the validation phase
    pub fn verification_gas_limit(&self) -> &str {
        &self.verification_gas_limit
    }

    /// Gas paid for bundler overhead
    pub fn pre_verification_gas(&self) -> &str {
        &self.pre_verification_gas
    }

    /// EIP-1559 max fee per gas
    pub fn max_fee_per_gas(&self) -> &str {
        &self.max_fee_per_gas
    }

    /// EIP-1559 max priority fee per gas
    pub fn max_priority_fee_per_gas(&self) -> &str {
        &self.max_priority_fee_per_gas
    }

    /// Paymaster address followed by paymaster-specific data
    pub fn paymaster_and_data(&self) -> &str {
        &self.paymaster_and_data
    }

    /// Account signature over the operation hash
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Fill an empty signature with a synthetic placeholder
    ///
    /// Simulation needs signature bytes of a realistic shape even before the
    /// user has signed. Returns the advisory notice when a placeholder was
    /// inserted, `None` when the operation already carried a signature.
    pub fn apply_placeholder_signature(
        &mut self,
        placeholder: SignaturePlaceholder,
    ) -> Option<SignatureNotice> {
        if self.signature != "0x" {
            return None;
        }

        self.signature = placeholder.to_hex();
        debug!(target: "userop-encoding", placeholder = ?placeholder, "Inserted placeholder signature");
        Some(SignatureNotice { placeholder })
    }

    /// Exchange the current placeholder for another one
    ///
    /// Returns `false`, leaving the operation untouched, when the current
    /// signature is a real one.
    pub fn swap_placeholder_signature(&mut self, placeholder: SignaturePlaceholder) -> bool {
        if self.placeholder_signature().is_none() {
            return false;
        }
        self.signature = placeholder.to_hex();
        true
    }

    /// Which placeholder the signature currently holds, if any
    pub fn placeholder_signature(&self) -> Option<SignaturePlaceholder> {
        [SignaturePlaceholder::Passkey, SignaturePlaceholder::Ecdsa]
            .into_iter()
            .find(|p| p.to_hex().eq_ignore_ascii_case(&self.signature))
    }

    /// Returns true if the signature is synthetic
    pub fn has_placeholder_signature(&self) -> bool {
        self.placeholder_signature().is_some()
    }

    /// Serializable view that flags a synthetic signature
    pub fn annotated(&self) -> AnnotatedOperation<'_> {
        AnnotatedOperation {
            operation: self,
            signature_placeholder: self.placeholder_signature().map(SignaturePlaceholder::name),
        }
    }
}

/// A [`UserOperation`] as displayed to users
///
/// Serializes as the operation's fields plus `signaturePlaceholder` naming the
/// placeholder kind when the signature is not a real one.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedOperation<'a> {
    #[serde(flatten)]
    operation: &'a UserOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature_placeholder: Option<&'static str>,
}

/// JavaScript-style truthiness, used to decide whether an envelope is present
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn read_field(
    source: &Map<String, Value>,
    field: &'static str,
    kind: FieldKind,
) -> Result<String, ParseError> {
    let value = match source.get(field) {
        None | Some(Value::Null) => return Ok(kind.default_value().to_string()),
        Some(value) => value,
    };

    if kind == FieldKind::Sender {
        return match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ParseError::InvalidSender),
        };
    }

    match value {
        Value::String(s) if s.is_empty() => Ok(kind.default_value().to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(kind.default_value().to_string()),
            Some(n) => Ok(format!("0x{n:x}")),
            None => Err(ParseError::InvalidField { field }),
        },
        Value::Bool(false) => Ok(kind.default_value().to_string()),
        _ => Err(ParseError::InvalidField { field }),
    }
}

sol! {
    #[derive(Debug)]
    struct WebAuthnAuth {
        bytes authenticatorData;
        string clientDataJSON;
        uint256 challengeIndex;
        uint256 typeIndex;
        uint256 r;
        uint256 s;
    }

    #[derive(Debug)]
    struct SignatureWrapper {
        uint256 ownerIndex;
        bytes signatureData;
    }
}

const DUMMY_AUTHENTICATOR_DATA: [u8; 37] =
    hex!("49960de5880e8c687434170f6476605b8fe4aeb9a28632c7995cf3ba831d97630500000000");

const DUMMY_CLIENT_DATA_JSON: &str = r#"{"type":"webauthn.get","challenge":"9jEFijuhEWrM4SOW-tChJbUEHEP44VcjcJ-Bqo1fTM8","origin":"https://keys.coinbase.com","crossOrigin":false}"#;

const DUMMY_ECDSA_SIGNATURE: [u8; 65] = hex!(
    "fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c"
);

/// Synthetic signature used when the user has not signed yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignaturePlaceholder {
    /// Smart-wallet `SignatureWrapper` around a WebAuthn assertion
    #[default]
    Passkey,
    /// 65-byte `r || s || v` ECDSA signature
    Ecdsa,
}

impl SignaturePlaceholder {
    /// Raw placeholder bytes
    pub fn bytes(self) -> Bytes {
        match self {
            Self::Passkey => {
                let auth = WebAuthnAuth {
                    authenticatorData: Bytes::from_static(&DUMMY_AUTHENTICATOR_DATA),
                    clientDataJSON: DUMMY_CLIENT_DATA_JSON.to_string(),
                    challengeIndex: U256::from(23),
                    typeIndex: U256::from(1),
                    r: uint!(0x5e7e0e1a2a4f0a06c4aa3f2a6f48bd2bc5f0c4d3ea23f4fa1b0a4a0ec7f0d9c1_U256),
                    s: uint!(0x3c1a6bd3f1d3a3c44b6d3f8bd7a70f1b4cd1e40df2d9e8b23c7fa61e90a7b2d4_U256),
                };
                SignatureWrapper { ownerIndex: U256::ZERO, signatureData: auth.abi_encode().into() }
                    .abi_encode()
                    .into()
            }
            Self::Ecdsa => Bytes::from_static(&DUMMY_ECDSA_SIGNATURE),
        }
    }

    /// Short name used when flagging a synthetic signature
    pub const fn name(self) -> &'static str {
        match self {
            Self::Passkey => "passkey",
            Self::Ecdsa => "ecdsa",
        }
    }

    /// Placeholder as a `0x`-prefixed hex string
    pub fn to_hex(self) -> String {
        self.bytes().to_string()
    }
}

/// Advisory attached to an operation whose signature was synthesised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureNotice {
    /// The placeholder that was inserted
    pub placeholder: SignaturePlaceholder,
}

impl std::fmt::Display for SignatureNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.placeholder {
            SignaturePlaceholder::Passkey => {
                f.write_str("Note: A dummy passkey signature was added since none was provided.")
            }
            SignaturePlaceholder::Ecdsa => {
                f.write_str("Note: A dummy ECDSA signature was added since none was provided.")
            }
        }
    }
}
