//! Platform boundary errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The acting agent lacks the permission the call needs.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Voice support is compiled out or its codec library is missing.
    #[error("voice codec support is missing")]
    MissingCodec,

    /// The target (participant, group, channel) no longer exists or left.
    #[error("not found: {0}")]
    NotFound(String),

    /// The agent has no active voice connection.
    #[error("not connected to a voice group")]
    NotConnected,

    /// A transient failure talking to the service.
    #[error("service error: {0}")]
    Service(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlatformError {
    /// Whether this is the permission-denied condition.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
