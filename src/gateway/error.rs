//! gateway::error
//!
//! Gateway failures and their envelope kinds.

use thiserror::Error;

use crate::env::EnvError;
use crate::envelope::{Envelope, ErrorKind};
use crate::forge::ForgeError;

/// Errors from gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No usable credential.
    #[error("GitHub is not configured correctly: {0}")]
    Configuration(#[from] EnvError),

    /// Bad or missing input, detected before any remote call.
    #[error("{0}")]
    InvalidArgument(String),

    /// Remote state forbids the operation.
    #[error("{0}")]
    InvalidState(String),

    /// No handle could be created.
    #[error("Failed to connect to GitHub: {0}")]
    RemoteUnavailable(ForgeError),

    /// A remote call failed while performing `action`.
    #[error("Failed to {action}: {source}")]
    Remote {
        action: String,
        #[source]
        source: ForgeError,
    },

    /// The payload could not be built.
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    /// Unexpected failure, including a caught panic.
    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GatewayError::InvalidArgument(message.into())
    }

    /// Envelope kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Configuration(_) => ErrorKind::Configuration,
            GatewayError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GatewayError::InvalidState(_) => ErrorKind::InvalidState,
            GatewayError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            GatewayError::Remote { source, .. } => classify(source),
            GatewayError::Encode(_) | GatewayError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Kind for a remote failure: not-found first, then transport conditions
/// (a refused credential or permission included); anything left is internal.
///
/// `Connection` only arises while building a handle and keeps its own kind.
pub fn classify(err: &ForgeError) -> ErrorKind {
    match err {
        ForgeError::NotFound(_) => ErrorKind::NotFound,
        ForgeError::AuthFailed(_)
        | ForgeError::NetworkError(_)
        | ForgeError::RateLimited
        | ForgeError::ApiError { .. } => ErrorKind::Transport,
        ForgeError::Connection(_) => ErrorKind::RemoteUnavailable,
        ForgeError::Decode(_) => ErrorKind::Internal,
    }
}

impl From<GatewayError> for Envelope {
    fn from(err: GatewayError) -> Self {
        Envelope::error(err.kind(), err.to_string())
    }
}

/// Attach the attempted action to a remote failure.
pub(crate) trait RemoteContext<T> {
    fn during(self, action: impl FnOnce() -> String) -> Result<T, GatewayError>;
}

impl<T> RemoteContext<T> for Result<T, ForgeError> {
    fn during(self, action: impl FnOnce() -> String) -> Result<T, GatewayError> {
        self.map_err(|source| GatewayError::Remote {
            action: action(),
            source,
        })
    }
}
