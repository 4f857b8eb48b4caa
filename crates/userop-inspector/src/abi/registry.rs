//! Bundled ABIs for well-known v0.6 contracts.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;

use crate::contracts::{
    ENTRYPOINT_V06_ADDRESS, IEntryPointV06, IPaymasterV06, ISenderCreatorV06,
    SENDER_CREATOR_V06_ADDRESS,
};

/// Address-keyed ABIs fixed at startup
///
/// Entries take priority over every other resolution source and never expire.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: HashMap<Address, Arc<JsonAbi>>,
}

impl StaticRegistry {
    /// Registry with the EntryPoint, SenderCreator and the given paymasters
    pub fn v06(paymasters: impl IntoIterator<Item = Address>) -> Self {
        let mut registry = Self::default();
        registry.insert(ENTRYPOINT_V06_ADDRESS, IEntryPointV06::abi::contract());
        registry.insert(SENDER_CREATOR_V06_ADDRESS, ISenderCreatorV06::abi::contract());

        let paymaster_abi = Arc::new(IPaymasterV06::abi::contract());
        for paymaster in paymasters {
            registry.entries.insert(paymaster, Arc::clone(&paymaster_abi));
        }
        registry
    }

    /// Register `abi` for `address`, replacing any earlier entry
    pub fn insert(&mut self, address: Address, abi: JsonAbi) {
        self.entries.insert(address, Arc::new(abi));
    }

    /// ABI registered for `address`
    pub fn get(&self, address: &Address) -> Option<Arc<JsonAbi>> {
        self.entries.get(address).cloned()
    }

    /// Number of registered addresses
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
