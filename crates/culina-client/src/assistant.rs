//! `POST /chat` as an [`Assistant`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use culina_chat::{Assistant, ChatError, ChatRequest};

use crate::client::{server_error, ApiClient};

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

#[async_trait]
impl Assistant for ApiClient {
    async fn reply(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let response = self
            .http()
            .post(self.url("chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Assistant(server_error(status)));
        }
        let body: ChatReply = response
            .json()
            .await
            .map_err(|e| ChatError::Assistant(format!("invalid reply: {}", e)))?;
        debug!(length = body.response.len(), "Assistant replied");
        Ok(body.response)
    }
}
