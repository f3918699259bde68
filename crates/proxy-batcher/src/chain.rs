//! Chain query and submission capability.
//!
//! The trait mirrors the handful of RPC operations the batching core needs
//! without binding to a concrete transport, so tests substitute an in-process
//! implementation. Transport timeouts surface as [`BatchError::Network`],
//! never as success or a silent drop.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;

use crate::error::{BatchError, BatchStage};

/// Transport-agnostic chain access used by the batching core.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id the client is connected to.
    async fn chain_id(&self) -> Result<u64, BatchError>;

    /// Code at `address`; empty when no contract is deployed there.
    async fn get_code(&self, address: Address) -> Result<Bytes, BatchError>;

    /// Read-only call of `data` against `target`.
    async fn call(&self, target: Address, data: Bytes) -> Result<Bytes, BatchError>;

    /// Signs with the connected wallet and broadcasts `tx`.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, BatchError>;

    /// Block number `hash` was included in, if it has been mined.
    async fn transaction_block(&self, hash: TxHash) -> Result<Option<u64>, BatchError>;
}

fn network_error(stage: BatchStage, err: impl std::fmt::Display) -> BatchError {
    BatchError::Network { stage, reason: err.to_string() }
}

/// [`ChainClient`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct AlloyChainClient<P> {
    provider: P,
}

impl<P> AlloyChainClient<P> {
    /// Wraps `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync> ChainClient for AlloyChainClient<P> {
    async fn chain_id(&self) -> Result<u64, BatchError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| network_error(BatchStage::Init, e))
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, BatchError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| network_error(BatchStage::ResolvingAccount, e))
    }

    async fn call(&self, target: Address, data: Bytes) -> Result<Bytes, BatchError> {
        let tx = TransactionRequest::default().with_to(target).with_input(data);
        self.provider
            .call(tx)
            .await
            .map_err(|e| network_error(BatchStage::ResolvingAccount, e))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, BatchError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| network_error(BatchStage::Dispatching, e))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_block(&self, hash: TxHash) -> Result<Option<u64>, BatchError> {
        let transaction = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| network_error(BatchStage::Dispatching, e))?;
        Ok(transaction.and_then(|tx| tx.block_number))
    }
}
