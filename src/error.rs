use std::time::Duration;

use crate::deployment::DeploymentResult;
use crate::types::ChainId;

/// Every way a deployment can terminate without a confirmed contract.
///
/// None of these are retried locally. Each one points at something the caller
/// has to fix or decide on (including whether to re-submit after a timeout).
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("network `{0}` is not registered")]
    UnknownNetwork(String),

    #[error("network `{0}` is already registered")]
    DuplicateNetwork(String),

    #[error("network profile `{id}` is invalid: {reason}")]
    InvalidProfile { id: String, reason: String },

    #[error("no secret found for credential reference `{0}`")]
    MissingSecret(String),

    #[error("secret behind credential reference `{reference}` is not a valid signing key")]
    InvalidCredential { reference: String },

    #[error(
        "endpoint for `{network}` reports chain id {actual}, profile expects {expected}"
    )]
    ChainIdMismatch {
        network: String,
        expected: ChainId,
        actual: ChainId,
    },

    #[error("cannot bind constructor parameters: {0}")]
    ParameterBinding(String),

    #[error("contract artifact error: {0}")]
    Artifact(String),

    #[error("endpoint error: {0}")]
    Submission(String),

    #[error(
        "transaction {:?} not confirmed within {timeout:?}",
        .result.transaction_hash
    )]
    DeploymentTimeout {
        result: Box<DeploymentResult>,
        timeout: Duration,
    },

    #[error("contract creation {:?} was mined but reverted", .result.transaction_hash)]
    DeploymentReverted { result: Box<DeploymentResult> },

    #[error(
        "lost track of broadcast transaction {:?}: {reason}",
        .result.transaction_hash
    )]
    Untracked {
        result: Box<DeploymentResult>,
        reason: String,
    },
}

impl DeployError {
    pub fn submission(err: impl std::fmt::Display) -> Self {
        Self::Submission(err.to_string())
    }

    /// Stable name of the error kind, printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownNetwork(_) => "UnknownNetworkError",
            Self::DuplicateNetwork(_) => "DuplicateNetworkError",
            Self::InvalidProfile { .. } => "InvalidProfileError",
            Self::MissingSecret(_) => "MissingSecretError",
            Self::InvalidCredential { .. } => "InvalidCredentialError",
            Self::ChainIdMismatch { .. } => "ChainIdMismatchError",
            Self::ParameterBinding(_) => "ParameterBindingError",
            Self::Artifact(_) => "ArtifactError",
            Self::Submission(_) | Self::Untracked { .. } => "SubmissionError",
            Self::DeploymentTimeout { .. } => "DeploymentTimeoutError",
            Self::DeploymentReverted { .. } => "DeploymentRevertedError",
        }
    }

    /// The failed result, for errors raised after the transaction was broadcast.
    pub fn result(&self) -> Option<&DeploymentResult> {
        match self {
            Self::DeploymentTimeout { result, .. }
            | Self::DeploymentReverted { result }
            | Self::Untracked { result, .. } => Some(result),
            _ => None,
        }
    }
}
