//! On-chain interfaces the batching core invokes.
//!
//! Deliberately minimal: the factory's combined deploy-and-execute entry
//! point plus its creation-code view, the multi-send helper, and the proxy
//! account's execution and nonce surface. Application-level contract
//! knowledge stays with the caller.

use alloy_sol_types::sol;

sol! {
    /// Factory that instantiates proxy accounts at deterministic addresses.
    #[derive(Debug, PartialEq)]
    interface IProxyFactory {
        /// Creation code of the proxy contract the factory deploys.
        function proxyCreationCode() external pure returns (bytes memory);

        /// Deploys the owner's proxy and executes its first transaction in
        /// one call.
        function createProxyAndExecTransaction(
            address masterCopy,
            uint256 saltNonce,
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            address owner,
            bytes calldata signature
        ) external payable returns (bool execTransactionSuccess);
    }

    /// Helper whose sole function is to execute a packed sequence of
    /// sub-calls within one top-level call.
    #[derive(Debug, PartialEq)]
    interface IMultiSend {
        function multiSend(bytes memory transactions) external payable;
    }

    /// Per-owner proxy account.
    #[derive(Debug, PartialEq)]
    interface IProxyAccount {
        /// Replay-protection nonce, incremented per executed transaction.
        function nonce() external view returns (uint256);

        /// Executes an owner-authorized transaction.
        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes calldata signatures
        ) external payable returns (bool success);
    }
}
