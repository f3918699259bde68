//! Relay capability: hand a signed submission to a gas-sponsoring service.
//!
//! The relay holds its own signing key and pays gas to broadcast; it is
//! trusted to fill the replay-protection fields consistently with the account
//! state it observes at broadcast time. The endpoint comes from
//! configuration — nothing is hard-coded here.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ProxyDeployment;
use crate::error::{BatchError, BatchStage};
use crate::types::{ProxyAccountState, SignedSubmission, TransactionReference};

/// Wire form of a signed submission handed to a relay.
///
/// Gas parameters and the refund receiver are zeroed; the relay fills them
/// deterministically before broadcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySubmission {
    /// Owner authorizing the submission.
    pub owner: Address,
    /// The owner's proxy account.
    pub proxy: Address,
    /// Whether the proxy already exists; the relay deploys it first
    /// otherwise, in the same transaction.
    pub deployed: bool,
    /// Implementation for a first-time deployment.
    pub master_copy: Address,
    /// Salt nonce for a first-time deployment.
    pub salt_nonce: U256,
    /// Call target.
    pub to: Address,
    /// Forwarded native value.
    pub value: U256,
    /// Call payload.
    pub data: Bytes,
    /// Operation kind, matching the on-chain enum encoding.
    pub operation: u8,
    /// Gas limit for the inner execution; zero, filled by the relay.
    pub safe_tx_gas: U256,
    /// Base gas reimbursement; zero, filled by the relay.
    pub base_gas: U256,
    /// Reimbursement gas price; zero, filled by the relay.
    pub gas_price: U256,
    /// Reimbursement token; zero address for native.
    pub gas_token: Address,
    /// Refund receiver; zero, filled by the relay.
    pub refund_receiver: Address,
    /// Account nonce the signature was produced against.
    pub nonce: U256,
    /// Normalized owner signature over the canonical digest.
    pub signature: Bytes,
}

impl RelaySubmission {
    /// Assembles the wire form from a signed submission and the account
    /// state it was signed against.
    pub fn from_parts(
        signed: &SignedSubmission,
        state: &ProxyAccountState,
        deployment: &ProxyDeployment,
    ) -> Self {
        Self {
            owner: signed.signer_address,
            proxy: state.proxy_address,
            deployed: state.is_deployed,
            master_copy: deployment.master_copy,
            salt_nonce: deployment.salt_nonce,
            to: signed.submission.target,
            value: signed.submission.value,
            data: signed.submission.payload.clone(),
            operation: signed.submission.kind as u8,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce: state.nonce,
            signature: signed.signature.clone(),
        }
    }
}

/// Response a relay returns for a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Whether the relay accepted the submission for broadcasting.
    pub accepted: bool,
    /// Hash of the broadcast transaction when accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    /// Reason the submission was declined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// External relay service accepting signed submissions.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Hands `submission` to the relay, returning the broadcast transaction.
    async fn submit_signed(
        &self,
        submission: RelaySubmission,
    ) -> Result<TransactionReference, BatchError>;
}

/// [`RelayApi`] over a JSON/HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRelayClient {
    /// Client posting submissions to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self { client: reqwest::Client::new(), endpoint }
    }
}

#[async_trait]
impl RelayApi for HttpRelayClient {
    async fn submit_signed(
        &self,
        submission: RelaySubmission,
    ) -> Result<TransactionReference, BatchError> {
        debug!(endpoint = %self.endpoint, proxy = %submission.proxy, "handing submission to relay");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&submission)
            .send()
            .await
            .map_err(|e| BatchError::Network {
                stage: BatchStage::Dispatching,
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| BatchError::Network {
            stage: BatchStage::Dispatching,
            reason: e.to_string(),
        })?;

        if status.is_server_error() {
            return Err(BatchError::Network {
                stage: BatchStage::Dispatching,
                reason: format!("relay returned {status}"),
            });
        }
        if !status.is_success() {
            // Business rejections come back as a JSON error body; anything
            // else is surfaced raw.
            let reason = serde_json::from_str::<RelayResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or(body);
            return Err(BatchError::RelayRejected(reason));
        }

        let parsed: RelayResponse =
            serde_json::from_str(&body).map_err(|e| BatchError::Network {
                stage: BatchStage::Dispatching,
                reason: format!("malformed relay response: {e}"),
            })?;
        if !parsed.accepted {
            return Err(BatchError::RelayRejected(
                parsed.error.unwrap_or_else(|| "submission declined".to_string()),
            ));
        }
        let hash = parsed.tx_hash.ok_or_else(|| BatchError::Network {
            stage: BatchStage::Dispatching,
            reason: "relay accepted without a transaction hash".to_string(),
        })?;
        Ok(TransactionReference { hash })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, bytes};

    use super::*;
    use crate::types::{CanonicalSubmission, Operation, OperationKind};

    #[test]
    fn wire_form_zeroes_the_relay_filled_fields() {
        let operation = Operation::delegate_call(
            address!("00000000000000000000000000000000000000aa"),
            bytes!("8d80ff0a"),
        );
        let signed = SignedSubmission {
            submission: CanonicalSubmission::from(operation),
            signature: Bytes::from(vec![0u8; 65]),
            signer_address: address!("5927ca8bf9807667b1e55f4c82eeb223aae38775"),
        };
        let state = ProxyAccountState {
            owner_address: signed.signer_address,
            proxy_address: address!("00000000000000000000000000000000000000cc"),
            is_deployed: false,
            nonce: U256::ZERO,
        };
        let deployment = crate::config::DeploymentRegistry::with_default_networks()
            .get(crate::config::XDAI)
            .unwrap()
            .clone();

        let wire = RelaySubmission::from_parts(&signed, &state, &deployment);
        assert_eq!(wire.operation, OperationKind::DelegateCall as u8);
        assert!(!wire.deployed);
        assert_eq!(wire.safe_tx_gas, U256::ZERO);
        assert_eq!(wire.base_gas, U256::ZERO);
        assert_eq!(wire.gas_price, U256::ZERO);
        assert_eq!(wire.gas_token, Address::ZERO);
        assert_eq!(wire.refund_receiver, Address::ZERO);
        assert_eq!(wire.nonce, U256::ZERO);
    }

    #[test]
    fn relay_response_round_trips_camel_case() {
        let response = RelayResponse {
            accepted: true,
            tx_hash: Some(b256!(
                "11eeff0000000000000000000000000000000000000000000000000000000000"
            )),
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"accepted\":true"));
        assert!(json.contains("\"txHash\""));
        let back: RelayResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.accepted, response.accepted);
        assert_eq!(back.tx_hash, response.tx_hash);
    }

    #[test]
    fn declined_response_parses_with_error_only() {
        let json = r#"{"accepted":false,"error":"insufficient sponsor balance"}"#;
        let response: RelayResponse = serde_json::from_str(json).unwrap();
        assert!(!response.accepted);
        assert!(response.tx_hash.is_none());
        assert_eq!(response.error.as_deref(), Some("insufficient sponsor balance"));
    }
}
