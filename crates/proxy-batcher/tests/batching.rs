//! End-to-end batch submission against in-process chain and relay doubles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, bytes, keccak256, Address, Bytes, TxHash, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use proxy_batcher::contracts::{IMultiSend, IProxyAccount, IProxyFactory};
use proxy_batcher::{
    decode_multi_send, transaction_hash, BatchError, BatchStage, CanonicalSubmission, ChainClient,
    DeploymentRegistry, DirectBackend, HashSigner, LocalHashSigner, Operation, OperationKind,
    ProxyAccountState, ProxyBatcher, ProxyDeployment, RelayApi, RelaySubmission, RelayedBackend,
    SignedSubmission, SubmissionBackend, TransactionReference,
};

const CHAIN_ID: u64 = 100;

/// Anvil dev account #0.
const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const TOKEN: Address = address!("00000000000000000000000000000000000000aa");
const MARKET_MAKER: Address = address!("00000000000000000000000000000000000000bb");

/// In-process chain double: configurable code and nonce responses, records
/// every transaction it is asked to broadcast.
struct MockChain {
    deployed: AtomicBool,
    unreachable: AtomicBool,
    nonce: Mutex<U256>,
    creation_code: Bytes,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl MockChain {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            deployed: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
            nonce: Mutex::new(U256::ZERO),
            creation_code: bytes!("608060405234801561001057600080fd5b50"),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn set_deployed(&self, deployed: bool, nonce: u64) {
        self.deployed.store(deployed, Ordering::SeqCst);
        *self.nonce.lock().unwrap() = U256::from(nonce);
    }

    fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, BatchError> {
        Ok(CHAIN_ID)
    }

    async fn get_code(&self, _address: Address) -> Result<Bytes, BatchError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BatchError::Network {
                stage: BatchStage::ResolvingAccount,
                reason: "rpc unreachable".to_string(),
            });
        }
        Ok(if self.deployed.load(Ordering::SeqCst) {
            bytes!("6080")
        } else {
            Bytes::new()
        })
    }

    async fn call(&self, _target: Address, data: Bytes) -> Result<Bytes, BatchError> {
        if data.starts_with(&IProxyFactory::proxyCreationCodeCall::SELECTOR) {
            return Ok(self.creation_code.abi_encode().into());
        }
        if data.starts_with(&IProxyAccount::nonceCall::SELECTOR) {
            return Ok(self.nonce.lock().unwrap().abi_encode().into());
        }
        Err(BatchError::Network {
            stage: BatchStage::ResolvingAccount,
            reason: "unexpected call".to_string(),
        })
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, BatchError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(keccak256(format!("tx-{}", sent.len())))
    }

    async fn transaction_block(&self, _hash: TxHash) -> Result<Option<u64>, BatchError> {
        Ok(Some(1))
    }
}

/// Relay double: records submissions, optionally rejects everything.
#[derive(Default)]
struct MockRelay {
    reject_with: Option<String>,
    submissions: Mutex<Vec<RelaySubmission>>,
}

impl MockRelay {
    fn rejecting(reason: &str) -> Arc<Self> {
        Arc::new(Self { reject_with: Some(reason.to_string()), ..Default::default() })
    }
}

#[async_trait]
impl RelayApi for MockRelay {
    async fn submit_signed(
        &self,
        submission: RelaySubmission,
    ) -> Result<TransactionReference, BatchError> {
        if let Some(reason) = &self.reject_with {
            return Err(BatchError::RelayRejected(reason.clone()));
        }
        self.submissions.lock().unwrap().push(submission);
        Ok(TransactionReference { hash: keccak256(b"relayed") })
    }
}

fn owner_signer() -> (Arc<LocalHashSigner>, Address) {
    let key: PrivateKeySigner = OWNER_KEY.parse().unwrap();
    let owner = key.address();
    (Arc::new(LocalHashSigner::new(key)), owner)
}

fn test_deployment() -> ProxyDeployment {
    DeploymentRegistry::with_default_networks()
        .get(CHAIN_ID)
        .unwrap()
        .clone()
        .with_creation_code(bytes!("608060405234801561001057600080fd5b50"))
}

fn direct_batcher(chain: Arc<MockChain>) -> (ProxyBatcher, Address) {
    let (signer, owner) = owner_signer();
    let backend = Arc::new(DirectBackend::new(chain.clone()));
    (ProxyBatcher::new(test_deployment(), chain, signer, backend), owner)
}

fn approve_operation() -> Operation {
    // approve(spender, 100)
    Operation::call_with_payload(
        TOKEN,
        bytes!("095ea7b300000000000000000000000000000000000000000000000000000000000000bb0000000000000000000000000000000000000000000000000000000000000064"),
    )
}

#[tokio::test]
async fn single_operation_direct_deployed_issues_one_proxy_call() {
    let chain = MockChain::new();
    chain.set_deployed(true, 3);
    let (batcher, owner) = direct_batcher(chain.clone());
    let proxy = batcher.proxy_address(owner).unwrap();

    let operation = approve_operation();
    let reference = batcher
        .submit_batch(std::slice::from_ref(&operation), owner)
        .await
        .unwrap();

    let sent = chain.sent();
    assert_eq!(sent.len(), 1, "exactly one on-chain call");
    assert_eq!(sent[0].to.unwrap().to().unwrap(), &proxy);

    let input = sent[0].input.input().unwrap();
    let call = IProxyAccount::execTransactionCall::abi_decode(input).unwrap();
    // Single-operation passthrough: the executed fields are the operation's.
    assert_eq!(call.to, operation.target);
    assert_eq!(call.value, operation.value);
    assert_eq!(call.data, operation.payload);
    assert_eq!(call.operation, OperationKind::Call as u8);
    assert_eq!(call.safeTxGas, U256::ZERO);
    assert_eq!(call.gasToken, Address::ZERO);
    assert_ne!(reference.hash, TxHash::ZERO);
}

#[tokio::test]
async fn undeployed_account_deploys_and_executes_in_one_transaction() {
    let chain = MockChain::new();
    let (batcher, owner) = direct_batcher(chain.clone());

    let operations = vec![
        approve_operation(),
        Operation::call_with_payload(MARKET_MAKER, bytes!("d0e30db0")),
    ];
    batcher.submit_batch(&operations, owner).await.unwrap();

    let sent = chain.sent();
    assert_eq!(sent.len(), 1, "deploy and first batch share one transaction");
    assert_eq!(
        sent[0].to.unwrap().to().unwrap(),
        &batcher.deployment().proxy_factory,
    );

    let input = sent[0].input.input().unwrap();
    let call = IProxyFactory::createProxyAndExecTransactionCall::abi_decode(input).unwrap();
    assert_eq!(call.masterCopy, batcher.deployment().master_copy);
    assert_eq!(call.owner, owner);
    assert_eq!(call.operation, OperationKind::DelegateCall as u8);
    assert_eq!(call.to, batcher.deployment().multi_send);
    assert_eq!(call.value, U256::ZERO);

    let inner = IMultiSend::multiSendCall::abi_decode(&call.data).unwrap();
    assert_eq!(decode_multi_send(&inner.transactions).unwrap(), operations);
}

#[tokio::test]
async fn relayed_batch_hands_off_with_zeroed_replay_fields() {
    let chain = MockChain::new();
    let relay = Arc::new(MockRelay::default());
    let (signer, owner) = owner_signer();
    let backend = Arc::new(RelayedBackend::new(relay.clone()));
    let batcher = ProxyBatcher::new(test_deployment(), chain.clone(), signer, backend);

    let operations = vec![
        approve_operation(),
        Operation::call_with_payload(MARKET_MAKER, bytes!("d0e30db0")),
    ];
    batcher.submit_batch(&operations, owner).await.unwrap();

    assert!(chain.sent().is_empty(), "relayed batches bypass the wallet connection");
    let submissions = relay.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    let wire = &submissions[0];
    assert_eq!(wire.owner, owner);
    assert!(!wire.deployed);
    assert_eq!(wire.nonce, U256::ZERO);
    assert_eq!(wire.safe_tx_gas, U256::ZERO);
    assert_eq!(wire.gas_price, U256::ZERO);
    assert_eq!(wire.refund_receiver, Address::ZERO);
    assert_eq!(wire.signature.len(), 65);
    let v = wire.signature[64];
    assert!(v == 31 || v == 32, "relayed signature is normalized, got v {v}");
}

#[tokio::test]
async fn relay_rejection_surfaces_verbatim_without_retry() {
    let chain = MockChain::new();
    let relay = MockRelay::rejecting("insufficient sponsor balance");
    let (signer, owner) = owner_signer();
    let backend = Arc::new(RelayedBackend::new(relay));
    let batcher = ProxyBatcher::new(test_deployment(), chain, signer, backend);

    let err = batcher
        .submit_batch(&[approve_operation()], owner)
        .await
        .unwrap_err();
    match err {
        BatchError::RelayRejected(reason) => assert_eq!(reason, "insufficient sponsor balance"),
        other => panic!("expected relay rejection, got {other}"),
    }
}

#[tokio::test]
async fn rpc_failure_during_resolution_is_not_treated_as_undeployed() {
    let chain = MockChain::new();
    chain.unreachable.store(true, Ordering::SeqCst);
    let (batcher, owner) = direct_batcher(chain.clone());

    let err = batcher
        .submit_batch(&[approve_operation()], owner)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), BatchStage::ResolvingAccount);
    assert!(err.is_retryable());
    assert!(chain.sent().is_empty(), "nothing may be dispatched on a failed lookup");
}

#[tokio::test]
async fn empty_batch_fails_before_any_network_traffic() {
    let chain = MockChain::new();
    let (batcher, owner) = direct_batcher(chain.clone());

    let err = batcher.submit_batch(&[], owner).await.unwrap_err();
    assert!(matches!(err, BatchError::InvalidBatch(_)));
    assert_eq!(err.stage(), BatchStage::Init);
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn missing_component_fails_before_dispatch() {
    let chain = MockChain::new();
    let (signer, owner) = owner_signer();
    let backend = Arc::new(DirectBackend::new(chain.clone()));
    let mut deployment = test_deployment();
    deployment.fallback_handler = Address::ZERO;
    let batcher = ProxyBatcher::new(deployment, chain.clone(), signer, backend);

    let err = batcher
        .submit_batch(&[approve_operation()], owner)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::Uninitialized("fallback handler")));
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn connect_rejects_chains_without_deployment_parameters() {
    let chain = MockChain::new();
    let (signer, _) = owner_signer();
    let backend = Arc::new(DirectBackend::new(chain.clone()));

    let err = ProxyBatcher::connect(&DeploymentRegistry::new(), chain, signer, backend)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::UnsupportedChain(CHAIN_ID)));
}

#[tokio::test]
async fn connect_resolves_creation_code_from_the_factory() {
    let chain = MockChain::new();
    let (signer, _) = owner_signer();
    let backend = Arc::new(DirectBackend::new(chain.clone()));

    let batcher = ProxyBatcher::connect(
        &DeploymentRegistry::with_default_networks(),
        chain.clone(),
        signer,
        backend,
    )
    .await
    .unwrap();
    assert_eq!(batcher.deployment().proxy_creation_code, chain.creation_code);
}

#[tokio::test]
async fn direct_backend_refuses_a_foreign_signature() {
    let chain = MockChain::new();
    let backend = DirectBackend::new(chain.clone());
    let deployment = test_deployment();

    // Signed by the dev key, but claimed to be from a different owner.
    let (signer, owner) = owner_signer();
    let impostor = address!("00000000000000000000000000000000000000ee");
    let submission = CanonicalSubmission::from(approve_operation());
    let state = ProxyAccountState {
        owner_address: impostor,
        proxy_address: address!("00000000000000000000000000000000000000cc"),
        is_deployed: true,
        nonce: U256::from(1),
    };
    let digest = transaction_hash(&submission, &state);
    let raw = signer.sign_hash(digest, owner).await.unwrap();
    let signature = proxy_batcher::normalize_signature(&raw).unwrap();
    let signed = SignedSubmission { submission, signature, signer_address: impostor };

    let err = backend.submit(&signed, &state, &deployment).await.unwrap_err();
    assert!(matches!(err, BatchError::InvalidSignature(_)));
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn stale_account_state_is_detectable_in_the_digest() {
    // A signature produced against the state captured before a prior batch
    // completed must differ from one produced after re-resolution; a relay
    // filling the nonce would otherwise broadcast a submission that fails
    // silently on-chain.
    let (_, owner) = owner_signer();
    let submission = CanonicalSubmission::from(approve_operation());
    let proxy = address!("00000000000000000000000000000000000000cc");

    let stale = ProxyAccountState {
        owner_address: owner,
        proxy_address: proxy,
        is_deployed: false,
        nonce: U256::ZERO,
    };
    let fresh = ProxyAccountState {
        owner_address: owner,
        proxy_address: proxy,
        is_deployed: true,
        nonce: U256::from(1),
    };
    assert_ne!(
        transaction_hash(&submission, &stale),
        transaction_hash(&submission, &fresh),
    );
}
