//! # Errors
//!
//! Error taxonomy shared by the client, connector, adapters and reconciler.
//!
//! Every component returns its error to the caller; nothing here retries.
//! The scheduler decides on requeue and backoff.

use thiserror::Error;

/// Errors raised while talking to the Magento API or resolving what is
/// needed to talk to it
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The referenced ProviderConfig does not exist or could not be read
    #[error("cannot get ProviderConfig {name}: {reason}")]
    ConfigNotFound { name: String, reason: String },

    /// Credentials could not be extracted from the configured source
    #[error("cannot get credentials: {0}")]
    CredentialResolution(String),

    /// Recording ProviderConfig usage failed
    #[error("cannot track ProviderConfig usage: {0}")]
    UsageTracking(String),

    /// Network, DNS, TLS or body decoding failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a status other than 200
    #[error("unexpected status {status} from Magento API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// An untyped payload is missing a key the reconciler relies on
    #[error("payload shape mismatch: missing {0}")]
    ShapeMismatch(String),

    /// External id is empty or the API has no resource under it
    #[error("resource with ID {id:?} in {path} not found")]
    NotFound { id: String, path: String },

    /// Up-to-date comparison was called with a missing side
    #[error("observed or desired resource is nil")]
    NilInput,

    /// Reading or writing the managed resource itself failed
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl ProviderError {
    /// Short machine-readable reason, used for condition reasons, event
    /// reasons and metric labels
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::ConfigNotFound { .. } => "ConfigNotFound",
            ProviderError::CredentialResolution(_) => "CredentialResolutionError",
            ProviderError::UsageTracking(_) => "UsageTrackingError",
            ProviderError::Transport(_) => "TransportError",
            ProviderError::UnexpectedStatus { .. } => "UnexpectedStatus",
            ProviderError::ShapeMismatch(_) => "ShapeMismatch",
            ProviderError::NotFound { .. } => "NotFound",
            ProviderError::NilInput => "NilInput",
            ProviderError::Kube(_) => "KubernetesError",
        }
    }
}

/// Result alias used across the library
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
