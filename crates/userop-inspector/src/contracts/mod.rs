//! Contract bindings and well-known constants.

mod v06;

pub use v06::{
    ENTRYPOINT_V06_ADDRESS, IAccountV06, IEntryPointV06, IPaymasterV06, ISenderCreatorV06,
    SENDER_CREATOR_V06_ADDRESS, UserOperationV06Packed,
};

use alloy_primitives::{Address, U256, uint};

/// Caller used for every simulated EntryPoint call
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Balance granted to overridden accounts in the state-override trace variant (`0xff` x 12)
pub const OVERRIDE_BALANCE: U256 = uint!(0xffffffffffffffffffffffff_U256);
