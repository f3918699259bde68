//! Per-chain deployment parameters for the proxy system contracts.
//!
//! The registry is passed to the orchestrator at construction; there is no
//! global address table. A chain without an entry is an explicit
//! [`BatchError::UnsupportedChain`] failure rather than an undefined lookup.

use std::collections::HashMap;

use alloy_primitives::{address, b256, Address, Bytes, B256, U256};

use crate::error::BatchError;

/// Ethereum mainnet chain id.
pub const MAINNET: u64 = 1;
/// Rinkeby testnet chain id.
pub const RINKEBY: u64 = 4;
/// xDai chain id.
pub const XDAI: u64 = 100;

/// Salt nonce shared by every account the factory deploys for this
/// application: `keccak256("Contract Proxy Kit")`.
pub const DEFAULT_SALT_NONCE: B256 =
    b256!("cfe33a586323e7325be6aa6ecd8b4600d232a9037e83c8ece69413b777dabe65");

/// Addresses and parameters of the proxy system contracts on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDeployment {
    /// Implementation contract every deployed proxy delegates to.
    pub master_copy: Address,
    /// Factory instantiating proxies at deterministic addresses.
    pub proxy_factory: Address,
    /// Helper contract executing packed operation sequences atomically.
    pub multi_send: Address,
    /// Fallback handler installed on newly deployed accounts.
    pub fallback_handler: Address,
    /// Creation code of the proxy contract, required for address derivation.
    /// May be left empty and resolved from the factory at connect time.
    pub proxy_creation_code: Bytes,
    /// Salt nonce the factory mixes into the CREATE2 salt.
    pub salt_nonce: U256,
}

impl ProxyDeployment {
    /// Deployment with the default salt nonce and no creation code yet.
    pub fn new(
        master_copy: Address,
        proxy_factory: Address,
        multi_send: Address,
        fallback_handler: Address,
    ) -> Self {
        Self {
            master_copy,
            proxy_factory,
            multi_send,
            fallback_handler,
            proxy_creation_code: Bytes::new(),
            salt_nonce: U256::from_be_bytes(DEFAULT_SALT_NONCE.0),
        }
    }

    /// Sets the proxy creation code.
    pub fn with_creation_code(mut self, creation_code: Bytes) -> Self {
        self.proxy_creation_code = creation_code;
        self
    }

    /// Overrides the salt nonce.
    pub fn with_salt_nonce(mut self, salt_nonce: U256) -> Self {
        self.salt_nonce = salt_nonce;
        self
    }

    /// Checks that every contract address is present.
    ///
    /// Runs before any network call; the creation code is checked separately
    /// at derivation time since it may still be resolved from the factory.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.master_copy.is_zero() {
            return Err(BatchError::Uninitialized("master copy"));
        }
        if self.proxy_factory.is_zero() {
            return Err(BatchError::Uninitialized("proxy factory"));
        }
        if self.multi_send.is_zero() {
            return Err(BatchError::Uninitialized("multi-send helper"));
        }
        if self.fallback_handler.is_zero() {
            return Err(BatchError::Uninitialized("fallback handler"));
        }
        Ok(())
    }
}

/// Registry of proxy deployments keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRegistry {
    deployments: HashMap<u64, ProxyDeployment>,
}

impl DeploymentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the canonical public-network deployments.
    ///
    /// The same contract set is deployed at the same addresses on every
    /// supported network.
    pub fn with_default_networks() -> Self {
        let canonical = ProxyDeployment::new(
            address!("34cfac646f301356faa8b21e94227e3583fe3f5f"),
            address!("0fb4340432e56c014fa96286de17222822a9281b"),
            address!("b522a9f781924ed250a11c54105e51840b138add"),
            address!("40a930851bd2e590bd5a5c981b436de25742e980"),
        );
        let mut registry = Self::new();
        for chain_id in [MAINNET, RINKEBY, XDAI] {
            registry.insert(chain_id, canonical.clone());
        }
        registry
    }

    /// Registers (or replaces) the deployment for `chain_id`.
    pub fn insert(&mut self, chain_id: u64, deployment: ProxyDeployment) {
        self.deployments.insert(chain_id, deployment);
    }

    /// Deployment parameters for `chain_id`.
    pub fn get(&self, chain_id: u64) -> Result<&ProxyDeployment, BatchError> {
        self.deployments.get(&chain_id).ok_or(BatchError::UnsupportedChain(chain_id))
    }

    /// Whether `chain_id` has registered parameters.
    pub fn contains(&self, chain_id: u64) -> bool {
        self.deployments.contains_key(&chain_id)
    }
}
