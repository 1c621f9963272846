//! Core errors.

use focus_gate_platform::PlatformError;
use thiserror::Error;

/// Why the agent could not join the initiator's voice group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    MissingCodec,
    PermissionDenied,
    Other(String),
}

impl From<PlatformError> for ConnectFailure {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::MissingCodec => Self::MissingCodec,
            PlatformError::PermissionDenied(_) => Self::PermissionDenied,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCodec => write!(f, "voice codec support is missing"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FocusError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    #[error("initiator is not in a voice group")]
    NoVoiceContext,

    #[error("voice connect failed: {reason}")]
    VoiceConnectFailed { reason: ConnectFailure },

    #[error("not connected to a voice group")]
    NotConnected,

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("session loop failed: {0}")]
    LoopInternal(String),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FocusError {
    /// The one message shown in the originating text channel.
    pub fn user_message(&self, prefix: &str) -> String {
        match self {
            Self::AlreadyRunning => format!(
                "A focus session is already running. Use `{prefix}stop` before starting another."
            ),
            Self::NotRunning => "No focus session is running right now.".to_string(),
            Self::NoVoiceContext => {
                "You need to be in a voice channel to do that.".to_string()
            }
            Self::VoiceConnectFailed {
                reason: ConnectFailure::MissingCodec,
            } => "I can't connect to voice: voice codec support is missing on the bot host."
                .to_string(),
            Self::VoiceConnectFailed {
                reason: ConnectFailure::PermissionDenied,
            } => "I don't have permission to connect to that voice channel.".to_string(),
            Self::VoiceConnectFailed {
                reason: ConnectFailure::Other(reason),
            } => format!("Error connecting to the voice channel: {reason}"),
            Self::NotConnected => "I'm not in any voice channel.".to_string(),
            Self::InvalidArguments(_) => format!(
                "Invalid format. Use `{prefix}pomodoro 45, 15` (minutes, comma separated)."
            ),
            Self::LoopInternal(reason) => {
                format!("An error occurred in the focus loop: {reason}")
            }
            Self::Config(_) | Self::Platform(_) | Self::Other(_) => {
                format!("An error occurred while running the command: `{self}`")
            }
        }
    }
}
