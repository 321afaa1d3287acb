//! Conversational interface for Culina.
//!
//! Keeps the chat transcript consistent while replies from the remote
//! assistant arrive asynchronously.

pub mod assistant;
pub mod error;
pub mod session;
pub mod types;

pub use assistant::Assistant;
pub use error::ChatError;
pub use session::{ChatSession, SendOutcome};
pub use types::{ChatEntry, ChatRequest, EntryBody, Transcript};
