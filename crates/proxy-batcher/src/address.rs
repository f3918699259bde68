//! Deterministic proxy account address derivation.

use alloy_primitives::{keccak256, Address};
use alloy_sol_types::SolValue;

use crate::config::ProxyDeployment;
use crate::error::BatchError;

/// Derives the proxy account address for `owner` under `deployment`.
///
/// Mirrors the factory's own CREATE2 computation bit-for-bit: the salt
/// commits to the owner and the fixed salt nonce, the init code to the proxy
/// creation code and the master copy. Same inputs always produce the same
/// address, before or after the account is deployed.
pub fn derive_proxy_address(
    owner: Address,
    deployment: &ProxyDeployment,
) -> Result<Address, BatchError> {
    if deployment.proxy_creation_code.is_empty() {
        return Err(BatchError::Uninitialized("proxy creation code"));
    }

    let salt = keccak256((owner, deployment.salt_nonce).abi_encode());

    let mut init_code =
        Vec::with_capacity(deployment.proxy_creation_code.len() + 32);
    init_code.extend_from_slice(&deployment.proxy_creation_code);
    init_code.extend_from_slice(&deployment.master_copy.abi_encode());
    let init_code_hash = keccak256(&init_code);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(deployment.proxy_factory.as_slice());
    preimage.extend_from_slice(salt.as_slice());
    preimage.extend_from_slice(init_code_hash.as_slice());

    Ok(Address::from_slice(&keccak256(&preimage)[12..]))
}
