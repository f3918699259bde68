//! Error taxonomy for batch submission.

use std::fmt;

use thiserror::Error;

/// Stage of the submission pipeline an error occurred in.
///
/// Callers use this to decide retry safety: only [`BatchError::Network`] is
/// retryable, and a retry must restart the whole pipeline so account state is
/// re-resolved — never re-dispatch a previously signed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    /// Batch and configuration validation, before any network call.
    Init,
    /// Proxy address derivation and on-chain state lookup.
    ResolvingAccount,
    /// Canonical submission construction.
    BuildingSubmission,
    /// Digest computation and owner signature production.
    Signing,
    /// Backend submission.
    Dispatching,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "initialization",
            Self::ResolvingAccount => "account resolution",
            Self::BuildingSubmission => "submission building",
            Self::Signing => "signing",
            Self::Dispatching => "dispatch",
        })
    }
}

/// Errors that can occur while building or submitting a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch itself is malformed (empty, or a packed payload that does
    /// not decode). Caller bug; retrying the same input cannot succeed.
    #[error("invalid batch: {0}")]
    InvalidBatch(&'static str),

    /// A required configuration component is missing. Fatal; surfaced before
    /// any network call.
    #[error("{0} uninitialized")]
    Uninitialized(&'static str),

    /// No deployment parameters are registered for the active chain.
    #[error("unsupported chain id {0}")]
    UnsupportedChain(u64),

    /// The signature is malformed or does not recover to the owner. The
    /// caller may re-sign and retry from the signing stage.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Transient RPC or relay connectivity failure, including transport
    /// timeouts. The caller may retry the whole batch from the start.
    #[error("network error during {stage}: {reason}")]
    Network {
        /// Stage the failure occurred in.
        stage: BatchStage,
        /// Underlying transport error.
        reason: String,
    },

    /// The relay declined the submission. Surfaced verbatim for user-facing
    /// messaging; not retried automatically.
    #[error("relay rejected submission: {0}")]
    RelayRejected(String),
}

impl BatchError {
    /// Returns the pipeline stage this error occurred in.
    pub const fn stage(&self) -> BatchStage {
        match self {
            Self::InvalidBatch(_) | Self::Uninitialized(_) | Self::UnsupportedChain(_) => {
                BatchStage::Init
            }
            Self::InvalidSignature(_) => BatchStage::Signing,
            Self::Network { stage, .. } => *stage,
            Self::RelayRejected(_) => BatchStage::Dispatching,
        }
    }

    /// True when retrying the batch from the start may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
