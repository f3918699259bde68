//! Value objects for proxy-account batch submission.

use alloy_primitives::{Address, Bytes, TxHash, U256};

/// Invocation mode of a batched operation.
///
/// The discriminants match the on-chain operation enum decoded by the proxy
/// account and the multi-send helper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationKind {
    /// Regular call against the target's own storage.
    #[default]
    Call = 0,
    /// The target's code runs in the calling account's storage context.
    DelegateCall = 1,
}

/// A single requested on-chain call.
///
/// Immutable once constructed. A batch is an ordered, non-empty sequence of
/// operations; they execute in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Invocation mode.
    pub kind: OperationKind,
    /// Contract the operation is addressed to.
    pub target: Address,
    /// Native value forwarded with the call.
    pub value: U256,
    /// Calldata passed to the target.
    pub payload: Bytes,
}

impl Operation {
    /// Plain call with no value and no calldata.
    pub fn call(target: Address) -> Self {
        Self { kind: OperationKind::Call, target, value: U256::ZERO, payload: Bytes::new() }
    }

    /// Call with calldata and no value.
    pub fn call_with_payload(target: Address, payload: Bytes) -> Self {
        Self { kind: OperationKind::Call, target, value: U256::ZERO, payload }
    }

    /// Delegate call with calldata.
    pub fn delegate_call(target: Address, payload: Bytes) -> Self {
        Self { kind: OperationKind::DelegateCall, target, value: U256::ZERO, payload }
    }

    /// Sets the forwarded native value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// The single unit actually submitted on-chain for a batch.
///
/// A batch of exactly one operation passes through verbatim; anything larger
/// becomes one delegate call to the multi-send helper carrying the packed
/// operation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSubmission {
    /// Invocation mode the proxy account executes with.
    pub kind: OperationKind,
    /// Call target: the sole operation's target, or the multi-send helper.
    pub target: Address,
    /// Forwarded native value; always zero on the multi-send path.
    pub value: U256,
    /// Call payload; the multi-send calldata on the multi-operation path.
    pub payload: Bytes,
}

impl From<Operation> for CanonicalSubmission {
    fn from(op: Operation) -> Self {
        Self { kind: op.kind, target: op.target, value: op.value, payload: op.payload }
    }
}

/// On-chain state of an owner's proxy account, resolved once per batch.
///
/// Never cached across batches: a prior batch may have deployed the account
/// or advanced its nonce, and a digest signed against stale state fails
/// on-chain rather than at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAccountState {
    /// The externally owned account controlling the proxy.
    pub owner_address: Address,
    /// Deterministically derived proxy address for this owner.
    pub proxy_address: Address,
    /// Whether contract code exists at `proxy_address`.
    pub is_deployed: bool,
    /// Current proxy nonce; zero while the account is undeployed.
    pub nonce: U256,
}

/// A canonical submission together with its owner authorization.
///
/// Created, dispatched once and discarded: the signed digest embeds the nonce
/// of the account state it was resolved against, so reuse is a replay risk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSubmission {
    /// The unit being authorized.
    pub submission: CanonicalSubmission,
    /// Normalized 65-byte owner signature over the canonical digest.
    pub signature: Bytes,
    /// Address the signature must recover to.
    pub signer_address: Address,
}

/// Reference to the transaction a batch was included with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReference {
    /// Hash of the submitted transaction.
    pub hash: TxHash,
}
