//! Submission backends: direct wallet submission or relayed sponsorship.
//!
//! The orchestrator is agnostic to how a signed submission reaches the chain;
//! the backend is selected at construction time and swapped without touching
//! the pipeline.

use std::sync::Arc;

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::chain::ChainClient;
use crate::config::ProxyDeployment;
use crate::contracts::{IProxyAccount, IProxyFactory};
use crate::error::BatchError;
use crate::hash::transaction_hash;
use crate::relay::{RelayApi, RelaySubmission};
use crate::signer::recover_signer;
use crate::types::{ProxyAccountState, SignedSubmission, TransactionReference};

/// Gets a signed submission included on-chain.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    /// Backend label used in logs.
    fn label(&self) -> &'static str;

    /// Submits `signed` for the account in `state`.
    async fn submit(
        &self,
        signed: &SignedSubmission,
        state: &ProxyAccountState,
        deployment: &ProxyDeployment,
    ) -> Result<TransactionReference, BatchError>;
}

/// Submits through the owner's own wallet connection.
///
/// Issues exactly one transaction per batch: `execTransaction` on the proxy
/// when it is deployed, or the factory's combined deploy-and-execute call
/// when it is not — so there is never an observable state where the account
/// exists but its first batch has not run.
pub struct DirectBackend {
    chain: Arc<dyn ChainClient>,
}

impl DirectBackend {
    /// Backend submitting through `chain`.
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl SubmissionBackend for DirectBackend {
    fn label(&self) -> &'static str {
        "direct"
    }

    async fn submit(
        &self,
        signed: &SignedSubmission,
        state: &ProxyAccountState,
        deployment: &ProxyDeployment,
    ) -> Result<TransactionReference, BatchError> {
        let digest = transaction_hash(&signed.submission, state);
        let recovered = recover_signer(digest, &signed.signature)?;
        if recovered != signed.signer_address {
            return Err(BatchError::InvalidSignature(format!(
                "recovered signer {recovered} does not match owner {}",
                signed.signer_address
            )));
        }

        let request = if state.is_deployed {
            let call = IProxyAccount::execTransactionCall {
                to: signed.submission.target,
                value: signed.submission.value,
                data: signed.submission.payload.clone(),
                operation: signed.submission.kind as u8,
                safeTxGas: U256::ZERO,
                baseGas: U256::ZERO,
                gasPrice: U256::ZERO,
                gasToken: Address::ZERO,
                refundReceiver: Address::ZERO,
                signatures: signed.signature.clone(),
            };
            debug!(proxy = %state.proxy_address, "submitting batch to deployed account");
            TransactionRequest::default()
                .with_from(state.owner_address)
                .with_to(state.proxy_address)
                .with_input(call.abi_encode())
        } else {
            let call = IProxyFactory::createProxyAndExecTransactionCall {
                masterCopy: deployment.master_copy,
                saltNonce: deployment.salt_nonce,
                to: signed.submission.target,
                value: signed.submission.value,
                data: signed.submission.payload.clone(),
                operation: signed.submission.kind as u8,
                owner: state.owner_address,
                signature: signed.signature.clone(),
            };
            debug!(
                proxy = %state.proxy_address,
                factory = %deployment.proxy_factory,
                "deploying account and executing first batch in one transaction"
            );
            TransactionRequest::default()
                .with_from(state.owner_address)
                .with_to(deployment.proxy_factory)
                .with_input(call.abi_encode())
        };

        let hash = self.chain.send_transaction(request).await?;
        Ok(TransactionReference { hash })
    }
}

/// Hands signed submissions to a gas-sponsoring relay.
///
/// Signature verification is deferred to the relay, which re-derives the
/// digest against the account state it observes before broadcasting.
pub struct RelayedBackend {
    relay: Arc<dyn RelayApi>,
}

impl RelayedBackend {
    /// Backend submitting through `relay`.
    pub fn new(relay: Arc<dyn RelayApi>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl SubmissionBackend for RelayedBackend {
    fn label(&self) -> &'static str {
        "relayed"
    }

    async fn submit(
        &self,
        signed: &SignedSubmission,
        state: &ProxyAccountState,
        deployment: &ProxyDeployment,
    ) -> Result<TransactionReference, BatchError> {
        let submission = RelaySubmission::from_parts(signed, state, deployment);
        debug!(proxy = %state.proxy_address, deployed = state.is_deployed, "relaying batch");
        self.relay.submit_signed(submission).await
    }
}
