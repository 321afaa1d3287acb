//! Transcript entries and the assistant request payload.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use culina_core::types::{ChatMessage, InventoryItem, Sender};

/// Published view of the whole conversation.
pub type Transcript = Arc<Vec<ChatEntry>>;

/// What a transcript entry currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryBody {
    Final(String),
    /// Reply still in flight.
    Pending,
    Failed(String),
}

/// One turn of the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: Uuid,
    pub sender: Sender,
    pub body: EntryBody,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            body: EntryBody::Final(text.into()),
        }
    }

    pub fn pending() -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            body: EntryBody::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.body, EntryBody::Pending)
    }

    /// Display text: failures read `Error: <reason>`, a pending reply is empty.
    pub fn text(&self) -> String {
        match &self.body {
            EntryBody::Final(text) => text.clone(),
            EntryBody::Pending => String::new(),
            EntryBody::Failed(reason) => format!("Error: {}", reason),
        }
    }

    /// Wire form sent to the assistant as history.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            sender: self.sender,
            text: self.text(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub inventory: Vec<InventoryItem>,
    pub history: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use culina_core::types::Category;

    #[test]
    fn test_entry_text() {
        assert_eq!(ChatEntry::user("hi").text(), "hi");
        assert_eq!(ChatEntry::pending().text(), "");

        let mut failed = ChatEntry::pending();
        failed.body = EntryBody::Failed("Server error: 502".to_string());
        assert_eq!(failed.text(), "Error: Server error: 502");
    }

    #[test]
    fn test_to_message_keeps_id_and_sender() {
        let entry = ChatEntry::user("hello");
        let message = entry.to_message();
        assert_eq!(message.id, entry.id);
        assert_eq!(message.sender, Sender::User);
        assert_eq!(message.text, "hello");
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest {
            message: "dinner?".to_string(),
            inventory: vec![InventoryItem::new("Eggs", Category::Fridge).with_amount("6")],
            history: vec![ChatEntry::user("dinner?").to_message()],
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["message"], "dinner?");
        assert_eq!(json["inventory"][0]["name"], "Eggs");
        assert_eq!(json["inventory"][0]["expirationDate"], "");
        assert_eq!(json["history"][0]["sender"], "user");
        assert_eq!(json["history"][0]["text"], "dinner?");
    }
}
