use thiserror::Error;

pub type PyxResult<T> = Result<T, PyxError>;

#[derive(Debug, Error)]
pub enum PyxError {
    #[error("failed to (de)serialize message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed '{event}' message: {reason}")]
    MalformedMessage { event: String, reason: String },

    #[error("malformed '{discriminator}' variant: {reason}")]
    MalformedVariant {
        discriminator: String,
        reason: String,
    },

    #[error("malformed preload plan key '{key}': {reason}")]
    MalformedPlan { key: String, reason: String },

    /// The server asked for a path that does not exist in the call-site arguments.
    /// This is a plan/signature mismatch between client and server, never a transient condition.
    #[error("invalid argument path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("no pending call with id '{0}'")]
    UnknownCall(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("unknown tagged variant '{0}'")]
    UnknownVariant(String),

    #[error("outbound channel closed: {0}")]
    Channel(String),

    #[error("session is closed")]
    SessionClosed,
}
