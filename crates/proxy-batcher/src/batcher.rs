//! Batch orchestration: resolve, build, sign, dispatch.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::address::derive_proxy_address;
use crate::backend::SubmissionBackend;
use crate::chain::ChainClient;
use crate::config::{DeploymentRegistry, ProxyDeployment};
use crate::contracts::{IMultiSend, IProxyAccount, IProxyFactory};
use crate::encode::encode_multi_send;
use crate::error::{BatchError, BatchStage};
use crate::hash::transaction_hash;
use crate::signer::{normalize_signature, HashSigner};
use crate::types::{
    CanonicalSubmission, Operation, OperationKind, ProxyAccountState, SignedSubmission,
    TransactionReference,
};

/// Single-operation batches pass through verbatim; larger batches become one
/// delegate call to the multi-send helper carrying the packed sequence.
fn build_canonical_submission(
    operations: &[Operation],
    multi_send: Address,
) -> Result<CanonicalSubmission, BatchError> {
    if let [only] = operations {
        return Ok(CanonicalSubmission::from(only.clone()));
    }
    let packed = encode_multi_send(operations)?;
    let payload = IMultiSend::multiSendCall { transactions: packed }.abi_encode();
    Ok(CanonicalSubmission {
        kind: OperationKind::DelegateCall,
        target: multi_send,
        value: U256::ZERO,
        payload: payload.into(),
    })
}

/// Orchestrates atomic batch submission through a per-owner proxy account.
///
/// One [`submit_batch`](Self::submit_batch) call runs the full pipeline for
/// one batch: account resolution, canonical submission building, signing,
/// dispatch. Nothing is cached between batches — account state is re-derived
/// every time, because a prior batch may have deployed the account or
/// advanced its nonce, and a digest signed against stale state fails on-chain
/// rather than at submission time.
///
/// The orchestrator is re-entrant: batches for the same owner may be in
/// flight concurrently, but no cross-batch ordering is guaranteed. A caller
/// that needs two batches applied in order must await the first before
/// submitting the second.
pub struct ProxyBatcher {
    deployment: ProxyDeployment,
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn HashSigner>,
    backend: Arc<dyn SubmissionBackend>,
}

impl std::fmt::Debug for ProxyBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyBatcher")
            .field("deployment", &self.deployment)
            .finish_non_exhaustive()
    }
}

impl ProxyBatcher {
    /// Orchestrator over already-resolved deployment parameters.
    pub fn new(
        deployment: ProxyDeployment,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn HashSigner>,
        backend: Arc<dyn SubmissionBackend>,
    ) -> Self {
        Self { deployment, chain, signer, backend }
    }

    /// Resolves the connected chain against `registry`, fetching the proxy
    /// creation code from the factory when the registry entry does not carry
    /// it.
    pub async fn connect(
        registry: &DeploymentRegistry,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn HashSigner>,
        backend: Arc<dyn SubmissionBackend>,
    ) -> Result<Self, BatchError> {
        let chain_id = chain.chain_id().await?;
        let mut deployment = registry.get(chain_id)?.clone();
        deployment.validate()?;
        if deployment.proxy_creation_code.is_empty() {
            let data = IProxyFactory::proxyCreationCodeCall {}.abi_encode();
            let raw = chain.call(deployment.proxy_factory, data.into()).await?;
            deployment.proxy_creation_code =
                IProxyFactory::proxyCreationCodeCall::abi_decode_returns(&raw).map_err(|e| {
                    BatchError::Network {
                        stage: BatchStage::Init,
                        reason: format!("malformed creation code response: {e}"),
                    }
                })?;
        }
        info!(chain_id, factory = %deployment.proxy_factory, "connected proxy batcher");
        Ok(Self::new(deployment, chain, signer, backend))
    }

    /// Submits `operations` as one atomic unit authorized by
    /// `signer_address`.
    ///
    /// Sole public entry point of the batching core. Errors identify the
    /// pipeline stage they occurred in ([`BatchError::stage`]); retry policy
    /// belongs to the caller and must restart here, never by re-dispatching a
    /// previously signed submission.
    pub async fn submit_batch(
        &self,
        operations: &[Operation],
        signer_address: Address,
    ) -> Result<TransactionReference, BatchError> {
        if operations.is_empty() {
            return Err(BatchError::InvalidBatch("empty operation list"));
        }
        self.deployment.validate()?;

        let state = self.resolve_account(signer_address).await?;
        debug!(
            proxy = %state.proxy_address,
            deployed = state.is_deployed,
            nonce = %state.nonce,
            "resolved proxy account"
        );

        let submission = build_canonical_submission(operations, self.deployment.multi_send)?;
        let digest = transaction_hash(&submission, &state);
        let raw = self.signer.sign_hash(digest, signer_address).await?;
        let signature = normalize_signature(&raw)?;
        let signed = SignedSubmission { submission, signature, signer_address };

        info!(
            backend = self.backend.label(),
            operations = operations.len(),
            proxy = %state.proxy_address,
            "dispatching batch"
        );
        let reference = self.backend.submit(&signed, &state, &self.deployment).await?;
        info!(hash = %reference.hash, "batch dispatched");
        Ok(reference)
    }

    /// Polls until the referenced transaction is included in a block.
    ///
    /// Returns the inclusion block number, or `None` when `max_polls`
    /// attempts pass without inclusion. Transport failures come back as
    /// [`BatchError::Network`], never as silent success.
    pub async fn wait_for_inclusion(
        &self,
        reference: &TransactionReference,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<Option<u64>, BatchError> {
        for attempt in 0..max_polls {
            if let Some(block) = self.chain.transaction_block(reference.hash).await? {
                debug!(hash = %reference.hash, block, "transaction included");
                return Ok(Some(block));
            }
            debug!(hash = %reference.hash, attempt, "transaction pending");
            tokio::time::sleep(poll_interval).await;
        }
        Ok(None)
    }

    /// Proxy account address this batcher derives for `owner`.
    pub fn proxy_address(&self, owner: Address) -> Result<Address, BatchError> {
        derive_proxy_address(owner, &self.deployment)
    }

    /// Deployment parameters the batcher operates with.
    pub fn deployment(&self) -> &ProxyDeployment {
        &self.deployment
    }

    /// Derives the proxy address and queries its current on-chain state.
    ///
    /// Runs at the start of every batch; an RPC failure surfaces as
    /// [`BatchError::Network`] rather than being treated as not-deployed,
    /// since wrongly taking the deploy path would revert on-chain.
    async fn resolve_account(&self, owner: Address) -> Result<ProxyAccountState, BatchError> {
        let proxy_address = derive_proxy_address(owner, &self.deployment)?;
        let code = self.chain.get_code(proxy_address).await?;
        let is_deployed = !code.is_empty();
        let nonce = if is_deployed {
            let data = IProxyAccount::nonceCall {}.abi_encode();
            let raw = self.chain.call(proxy_address, data.into()).await?;
            IProxyAccount::nonceCall::abi_decode_returns(&raw).map_err(|e| {
                BatchError::Network {
                    stage: BatchStage::ResolvingAccount,
                    reason: format!("malformed nonce response: {e}"),
                }
            })?
        } else {
            U256::ZERO
        };
        Ok(ProxyAccountState { owner_address: owner, proxy_address, is_deployed, nonce })
    }
}
