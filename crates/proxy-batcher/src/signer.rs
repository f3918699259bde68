//! Owner signature production, normalization and recovery.
//!
//! The raw signing operation is delegated to an external key holder (the
//! owner's wallet). This module owns the post-processing: wallets disagree on
//! the terminal recovery byte of an EIP-191 signature, and the proxy account
//! only accepts the prefixed-message range. An un-normalized recovery byte
//! fails on-chain recovery and reverts the whole batch, which is hard to
//! diagnose from the outside — so normalization happens here, once, before
//! dispatch.

use alloy_primitives::{eip191_hash_message, Address, Bytes, Signature, B256, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::error::BatchError;

/// Length of an encoded `r || s || v` signature.
pub const SIGNATURE_SIZE: usize = 65;

/// Recovery byte of an EIP-191 prefixed signature with even y parity.
const ETH_SIGN_V_EVEN: u8 = 31;
/// Recovery byte of an EIP-191 prefixed signature with odd y parity.
const ETH_SIGN_V_ODD: u8 = 32;

/// External key holder signing a 32-byte digest on behalf of an owner.
///
/// Implementations sign the digest as an EIP-191 personal message (the wallet
/// shows the raw hash). The returned signature is the wallet's raw 65-byte
/// output; recovery-byte normalization happens afterwards in
/// [`normalize_signature`].
#[async_trait]
pub trait HashSigner: Send + Sync {
    /// Signs `hash` with the key for `signer_address`.
    async fn sign_hash(&self, hash: B256, signer_address: Address) -> Result<Bytes, BatchError>;
}

/// In-process [`HashSigner`] backed by a local private key.
#[derive(Debug, Clone)]
pub struct LocalHashSigner {
    signer: PrivateKeySigner,
}

impl LocalHashSigner {
    /// Wraps `signer`.
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Address of the wrapped key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl HashSigner for LocalHashSigner {
    async fn sign_hash(&self, hash: B256, signer_address: Address) -> Result<Bytes, BatchError> {
        if signer_address != self.signer.address() {
            return Err(BatchError::InvalidSignature(format!(
                "no key for signer {signer_address}"
            )));
        }
        let signature = self
            .signer
            .sign_message(hash.as_slice())
            .await
            .map_err(|e| BatchError::InvalidSignature(format!("signing failed: {e}")))?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}

/// Remaps the recovery byte of a raw wallet signature into the range the
/// proxy account accepts for EIP-191 prefixed signatures.
///
/// A bare recovery id (`0`/`1`) is rebased by 31, the legacy transaction form
/// (`27`/`28`) by 4; both land on `31`/`32`. Any other terminal byte is
/// rejected with [`BatchError::InvalidSignature`].
pub fn normalize_signature(raw: &[u8]) -> Result<Bytes, BatchError> {
    if raw.len() != SIGNATURE_SIZE {
        return Err(BatchError::InvalidSignature(format!(
            "expected {SIGNATURE_SIZE} bytes, got {}",
            raw.len()
        )));
    }
    let v = raw[SIGNATURE_SIZE - 1];
    let normalized_v = match v {
        0 | 1 => v + 31,
        27 | 28 => v + 4,
        other => {
            return Err(BatchError::InvalidSignature(format!(
                "recovery byte {other} out of range"
            )))
        }
    };
    let mut normalized = raw.to_vec();
    normalized[SIGNATURE_SIZE - 1] = normalized_v;
    Ok(normalized.into())
}

/// Recovers the signer address from a normalized signature over `hash`.
///
/// `hash` is the raw canonical digest; recovery runs against its EIP-191
/// prefixed form, matching what the account contract verifies on-chain.
pub fn recover_signer(hash: B256, signature: &[u8]) -> Result<Address, BatchError> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(BatchError::InvalidSignature(format!(
            "expected {SIGNATURE_SIZE} bytes, got {}",
            signature.len()
        )));
    }
    let v = signature[SIGNATURE_SIZE - 1];
    if v != ETH_SIGN_V_EVEN && v != ETH_SIGN_V_ODD {
        return Err(BatchError::InvalidSignature(format!(
            "recovery byte {v} is not normalized"
        )));
    }
    let r = U256::from_be_slice(&signature[..32]);
    let s = U256::from_be_slice(&signature[32..64]);
    let parity = v == ETH_SIGN_V_ODD;
    let digest = eip191_hash_message(hash);
    Signature::new(r, s, parity)
        .recover_address_from_prehash(&digest)
        .map_err(|e| BatchError::InvalidSignature(format!("recovery failed: {e}")))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::keccak256;

    use super::*;

    /// Anvil dev account #0.
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn every_legal_recovery_byte_lands_in_the_canonical_range() {
        for (raw_v, expected_v) in [(0u8, 31u8), (1, 32), (27, 31), (28, 32)] {
            let mut raw = [0u8; SIGNATURE_SIZE];
            raw[SIGNATURE_SIZE - 1] = raw_v;
            let normalized = normalize_signature(&raw).unwrap();
            assert_eq!(normalized[SIGNATURE_SIZE - 1], expected_v, "raw v {raw_v}");
            assert_eq!(&normalized[..64], &raw[..64]);
        }
    }

    #[test]
    fn illegal_recovery_bytes_are_rejected() {
        for raw_v in [2u8, 26, 29, 30, 31, 32, 255] {
            let mut raw = [0u8; SIGNATURE_SIZE];
            raw[SIGNATURE_SIZE - 1] = raw_v;
            assert!(
                matches!(normalize_signature(&raw), Err(BatchError::InvalidSignature(_))),
                "raw v {raw_v} should be rejected"
            );
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(matches!(
            normalize_signature(&[0u8; 64]),
            Err(BatchError::InvalidSignature(_))
        ));
        assert!(matches!(
            normalize_signature(&[0u8; 66]),
            Err(BatchError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn sign_normalize_recover_round_trip() {
        let key: PrivateKeySigner = DEV_KEY.parse().unwrap();
        let owner = key.address();
        let signer = LocalHashSigner::new(key);

        let hash = keccak256(b"batch digest");
        let raw = signer.sign_hash(hash, owner).await.unwrap();
        let normalized = normalize_signature(&raw).unwrap();

        let v = normalized[SIGNATURE_SIZE - 1];
        assert!(v == 31 || v == 32);
        assert_eq!(recover_signer(hash, &normalized).unwrap(), owner);
    }

    #[tokio::test]
    async fn unknown_signer_address_is_rejected() {
        let key: PrivateKeySigner = DEV_KEY.parse().unwrap();
        let signer = LocalHashSigner::new(key);
        let err = signer
            .sign_hash(keccak256(b"batch digest"), Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidSignature(_)));
    }

    #[test]
    fn un_normalized_signatures_do_not_recover() {
        let mut signature = [0u8; SIGNATURE_SIZE];
        signature[SIGNATURE_SIZE - 1] = 27;
        assert!(matches!(
            recover_signer(keccak256(b"batch digest"), &signature),
            Err(BatchError::InvalidSignature(_))
        ));
    }
}
