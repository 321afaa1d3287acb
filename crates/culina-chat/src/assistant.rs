//! Seam to the remote chat assistant.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::ChatRequest;

/// Produces one reply for one request.
///
/// The session passes the raw user text, the current inventory and the
/// transcript so far. Prompt construction is the backend's job.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, request: &ChatRequest) -> Result<String, ChatError>;
}
