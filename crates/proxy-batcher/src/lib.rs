//! Atomic transaction batching through deterministic proxy accounts.
//!
//! Application code hands this crate an ordered list of on-chain operations
//! ("approve token", "add funding", "buy outcome shares") and gets back a
//! single transaction reference: the operations execute atomically through
//! the owner's proxy account, which is deployed on first use in the same
//! transaction that runs its first batch.
//!
//! # Components
//!
//! - [`types`]: operation and submission value objects
//! - [`encode`]: packed encoding for the multi-send helper
//! - [`address`]: deterministic proxy address derivation
//! - [`hash`]: the canonical digest the owner signs
//! - [`signer`]: signature production and recovery-byte normalization
//! - [`backend`]: direct and relayed submission backends
//! - [`batcher`]: the orchestrator tying the stages together
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use proxy_batcher::{
//!     AlloyChainClient, DeploymentRegistry, DirectBackend, LocalHashSigner,
//!     Operation, ProxyBatcher,
//! };
//!
//! let chain = Arc::new(AlloyChainClient::new(provider));
//! let backend = Arc::new(DirectBackend::new(chain.clone()));
//! let signer = Arc::new(LocalHashSigner::new(key));
//! let batcher = ProxyBatcher::connect(
//!     &DeploymentRegistry::with_default_networks(),
//!     chain,
//!     signer,
//!     backend,
//! )
//! .await?;
//!
//! let approve = Operation::call_with_payload(token, approve_calldata);
//! let fund = Operation::call_with_payload(market_maker, funding_calldata);
//! let reference = batcher.submit_batch(&[approve, fund], owner).await?;
//! ```
//!
//! Batches for the same owner may run concurrently, but ordering between
//! them is the caller's concern: await one submission before starting the
//! next when the second depends on the first.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod address;
pub mod backend;
pub mod batcher;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod encode;
pub mod error;
pub mod hash;
pub mod relay;
pub mod signer;
pub mod types;

pub use address::derive_proxy_address;
pub use backend::{DirectBackend, RelayedBackend, SubmissionBackend};
pub use batcher::ProxyBatcher;
pub use chain::{AlloyChainClient, ChainClient};
pub use config::{DeploymentRegistry, ProxyDeployment, DEFAULT_SALT_NONCE};
pub use encode::{decode_multi_send, encode_multi_send};
pub use error::{BatchError, BatchStage};
pub use hash::transaction_hash;
pub use relay::{HttpRelayClient, RelayApi, RelayResponse, RelaySubmission};
pub use signer::{normalize_signature, recover_signer, HashSigner, LocalHashSigner};
pub use types::{
    CanonicalSubmission, Operation, OperationKind, ProxyAccountState, SignedSubmission,
    TransactionReference,
};
