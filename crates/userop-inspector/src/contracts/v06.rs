//! EntryPoint v0.6 Contract Definitions
//!
//! v0.6 keeps `simulateHandleOp` and `simulateValidation` on the EntryPoint
//! itself; both always revert, carrying their result in a custom error.
//!
//! The interfaces are generated with `#[sol(abi)]` so the static ABI registry
//! can hand out a [`JsonAbi`](alloy_json_abi::JsonAbi) for each well-known
//! contract without shipping JSON files.

use alloy_primitives::{Address, address};
use alloy_sol_types::sol;

/// EntryPoint v0.6 address
pub const ENTRYPOINT_V06_ADDRESS: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// SenderCreator helper deployed alongside EntryPoint v0.6
pub const SENDER_CREATOR_V06_ADDRESS: Address =
    address!("7fc98430eAEdbb6070B35B39D798725049088348");

sol! {
    /// UserOperation as consumed by EntryPoint v0.6, fields in wire order
    #[derive(Debug, Default, PartialEq, Eq)]
    struct UserOperationV06Packed {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes paymasterAndData;
        bytes signature;
    }

    #[derive(Debug)]
    struct UserOpsPerAggregatorV06 {
        UserOperationV06Packed[] userOps;
        address aggregator;
        bytes signature;
    }

    #[derive(Debug)]
    struct MemoryUserOpV06 {
        address sender;
        uint256 nonce;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        address paymaster;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
    }

    #[derive(Debug)]
    struct UserOpInfoV06 {
        MemoryUserOpV06 mUserOp;
        bytes32 userOpHash;
        uint256 prefund;
        uint256 contextOffset;
        uint256 preOpGas;
    }

    #[derive(Debug)]
    struct DepositInfoV06 {
        uint112 deposit;
        bool staked;
        uint112 stake;
        uint32 unstakeDelaySec;
        uint48 withdrawTime;
    }

    #[derive(Debug)]
    struct ReturnInfoV06 {
        uint256 preOpGas;
        uint256 prefund;
        bool sigFailed;
        uint48 validAfter;
        uint48 validUntil;
        bytes paymasterContext;
    }

    #[derive(Debug)]
    struct StakeInfoV06 {
        uint256 stake;
        uint256 unstakeDelaySec;
    }

    #[derive(Debug)]
    struct AggregatorStakeInfoV06 {
        address aggregator;
        StakeInfoV06 stakeInfo;
    }

    /// EntryPoint v0.6 interface
    #[sol(abi)]
    #[derive(Debug)]
    interface IEntryPointV06 {
        /// Successful simulateHandleOp result, always delivered as a revert
        error ExecutionResult(
            uint256 preOpGas,
            uint256 paid,
            uint48 validAfter,
            uint48 validUntil,
            bool targetSuccess,
            bytes targetResult
        );

        error FailedOp(uint256 opIndex, string reason);

        error SenderAddressResult(address sender);

        error SignatureValidationFailed(address aggregator);

        error ValidationResult(
            ReturnInfoV06 returnInfo,
            StakeInfoV06 senderInfo,
            StakeInfoV06 factoryInfo,
            StakeInfoV06 paymasterInfo
        );

        error ValidationResultWithAggregation(
            ReturnInfoV06 returnInfo,
            StakeInfoV06 senderInfo,
            StakeInfoV06 factoryInfo,
            StakeInfoV06 paymasterInfo,
            AggregatorStakeInfoV06 aggregatorInfo
        );

        /// Execute a batch of UserOperations
        function handleOps(
            UserOperationV06Packed[] calldata ops,
            address payable beneficiary
        ) external;

        function handleAggregatedOps(
            UserOpsPerAggregatorV06[] calldata opsPerAggregator,
            address payable beneficiary
        ) external;

        /// Simulate the full execution of a UserOperation, then call `target`
        function simulateHandleOp(
            UserOperationV06Packed calldata op,
            address target,
            bytes calldata targetCallData
        ) external;

        function simulateValidation(UserOperationV06Packed calldata userOp) external;

        /// Self-call made by handleOps for each operation's execution phase
        function innerHandleOp(
            bytes memory callData,
            UserOpInfoV06 memory opInfo,
            bytes calldata context
        ) external returns (uint256 actualGasCost);

        function getUserOpHash(UserOperationV06Packed calldata userOp)
            external
            view
            returns (bytes32);

        function getSenderAddress(bytes memory initCode) external;

        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);

        function incrementNonce(uint192 key) external;

        function balanceOf(address account) external view returns (uint256);

        function getDepositInfo(address account)
            external
            view
            returns (DepositInfoV06 memory info);

        function depositTo(address account) external payable;

        function addStake(uint32 unstakeDelaySec) external payable;

        function unlockStake() external;

        function withdrawStake(address payable withdrawAddress) external;

        function withdrawTo(address payable withdrawAddress, uint256 withdrawAmount) external;
    }

    /// SenderCreator v0.6 interface
    #[sol(abi)]
    #[derive(Debug)]
    interface ISenderCreatorV06 {
        function createSender(bytes calldata initCode) external returns (address sender);
    }

    /// Paymaster interface as called by EntryPoint v0.6
    #[sol(abi)]
    #[derive(Debug)]
    interface IPaymasterV06 {
        enum PostOpMode {
            opSucceeded,
            opReverted,
            postOpReverted
        }

        function validatePaymasterUserOp(
            UserOperationV06Packed calldata userOp,
            bytes32 userOpHash,
            uint256 maxCost
        ) external returns (bytes memory context, uint256 validationData);

        function postOp(PostOpMode mode, bytes calldata context, uint256 actualGasCost) external;
    }

    /// Account interface as called by EntryPoint v0.6
    #[sol(abi)]
    #[derive(Debug)]
    interface IAccountV06 {
        function validateUserOp(
            UserOperationV06Packed calldata userOp,
            bytes32 userOpHash,
            uint256 missingAccountFunds
        ) external returns (uint256 validationData);
    }
}
