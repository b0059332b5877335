//! Error types for the sync layer.
//!
//! Uses `thiserror` for typed errors covering both transport channels
//! and command dispatch. Adapter tasks treat every variant as
//! recoverable -- they log, back off, and keep going -- so these mostly
//! surface in logs and in command outcomes, not as crashes.

/// Errors that can occur while synchronizing with the backend.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An HTTP request failed or returned a non-success status.
    #[error("http error: {0}")]
    Http(String),

    /// The backend reported a command failure.
    ///
    /// The control endpoints report failures as HTTP 200 bodies with
    /// `"status": "error"`, so this is raised from the reply body, not
    /// from the status code.
    #[error("backend rejected {action}: {reason}")]
    CommandRejected {
        /// Label of the rejected action.
        action: String,
        /// Backend-supplied reason.
        reason: String,
    },

    /// The WebSocket connection failed or was torn down mid-stream.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// A payload could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration is invalid (malformed URL, zero interval).
    #[error("config error: {0}")]
    Config(String),
}
