//! Error types for the conversational interface.

use culina_core::error::CulinaError;

/// Errors from the chat session and the assistant backend.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a reply is already in progress")]
    Busy,
    /// The assistant answered, but not with a usable reply.
    #[error("{0}")]
    Assistant(String),
    /// The assistant could not be reached.
    #[error("{0}")]
    Transport(String),
}

impl From<CulinaError> for ChatError {
    fn from(err: CulinaError) -> Self {
        match err {
            CulinaError::Transport(reason) => ChatError::Transport(reason),
            other => ChatError::Assistant(other.to_string()),
        }
    }
}

impl From<ChatError> for CulinaError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Transport(reason) => CulinaError::Transport(reason),
            other => CulinaError::Validation(other.to_string()),
        }
    }
}
