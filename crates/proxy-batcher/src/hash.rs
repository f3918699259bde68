//! The canonical digest an owner signs to authorize a submission.
//!
//! Composition mirrors what the proxy account verifies on-chain: an EIP-712
//! domain bound to the account address, and a transaction struct hash over
//! the submission fields plus the replay-protection fields. Gas parameters
//! and the refund receiver are fixed at zero — a relay fills them
//! deterministically — while the account nonce and address come from the
//! freshly resolved [`ProxyAccountState`], so a digest produced against stale
//! state differs from one produced against fresh state.

use alloy_primitives::{b256, keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

use crate::types::{CanonicalSubmission, ProxyAccountState};

/// `keccak256("EIP712Domain(address verifyingContract)")`.
const DOMAIN_TYPEHASH: B256 =
    b256!("035aff83d86937d35b32e04f0ddc6ff469290eef2f1b692d8a815c89404d4749");

/// `keccak256("SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,address gasToken,address refundReceiver,uint256 nonce)")`.
const TRANSACTION_TYPEHASH: B256 =
    b256!("bb8310d486368db6bd6f849402fdd73ad53d316b5a4b2644ad6efe0f941286d8");

/// Solidity layouts for hash encoding.
mod packing {
    use alloy_sol_types::sol;

    sol! {
        struct DomainForHash {
            bytes32 typeHash;
            address account;
        }

        struct TransactionForHash {
            bytes32 typeHash;
            address to;
            uint256 value;
            bytes32 dataHash;
            uint8 operation;
            uint256 safeTxGas;
            uint256 baseGas;
            uint256 gasPrice;
            address gasToken;
            address refundReceiver;
            uint256 nonce;
        }
    }
}

/// Computes the digest authorizing `submission` for the account in `state`.
pub fn transaction_hash(submission: &CanonicalSubmission, state: &ProxyAccountState) -> B256 {
    let domain = packing::DomainForHash {
        typeHash: DOMAIN_TYPEHASH,
        account: state.proxy_address,
    };
    let transaction = packing::TransactionForHash {
        typeHash: TRANSACTION_TYPEHASH,
        to: submission.target,
        value: submission.value,
        dataHash: keccak256(&submission.payload),
        operation: submission.kind as u8,
        safeTxGas: U256::ZERO,
        baseGas: U256::ZERO,
        gasPrice: U256::ZERO,
        gasToken: Address::ZERO,
        refundReceiver: Address::ZERO,
        nonce: state.nonce,
    };

    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(keccak256(domain.abi_encode()).as_slice());
    preimage.extend_from_slice(keccak256(transaction.abi_encode()).as_slice());
    keccak256(&preimage)
}
