//! Chat session: the transcript and the one-reply-at-a-time send loop.
//!
//! A send appends the user turn and a pending bot entry in a single
//! published change, then asks the assistant. The reply (or the failure)
//! replaces the pending entry in place, located by its own id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use culina_core::config::ChatConfig;
use culina_core::types::InventoryItem;

use crate::assistant::Assistant;
use crate::error::ChatError;
use crate::types::{ChatEntry, ChatRequest, EntryBody, Transcript};

/// Result of one `send_message` call.
#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Another reply is in flight; nothing happened.
    Busy,
    /// Input longer than the configured limit; nothing happened.
    TooLong(usize),
    Replied(String),
    /// The pending entry now shows this failure.
    Failed(ChatError),
}

impl SendOutcome {
    /// The reply text, or the reason there is none.
    pub fn into_result(self) -> Result<String, ChatError> {
        match self {
            SendOutcome::Replied(reply) => Ok(reply),
            SendOutcome::Ignored => Err(ChatError::EmptyMessage),
            SendOutcome::Busy => Err(ChatError::Busy),
            SendOutcome::TooLong(limit) => Err(ChatError::MessageTooLong(limit)),
            SendOutcome::Failed(err) => Err(err),
        }
    }
}

/// A single conversation with the assistant.
pub struct ChatSession {
    assistant: Arc<dyn Assistant>,
    inventory: watch::Receiver<Arc<Vec<InventoryItem>>>,
    transcript: watch::Sender<Transcript>,
    busy: AtomicBool,
    max_message_length: usize,
}

/// Holds the busy flag for one send.
///
/// If the send is dropped before the reply lands, the pending entry is
/// marked failed so the transcript never keeps an orphaned placeholder.
struct InFlight<'a> {
    session: &'a ChatSession,
    pending: Option<Uuid>,
}

impl<'a> InFlight<'a> {
    fn acquire(session: &'a ChatSession) -> Option<Self> {
        session
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                session,
                pending: None,
            })
    }

    fn finish(mut self) {
        self.pending = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            warn!(entry = %id, "Chat send dropped before the reply arrived");
            self.session
                .resolve(id, EntryBody::Failed("request cancelled".to_string()));
        }
        self.session.busy.store(false, Ordering::Release);
    }
}

impl ChatSession {
    /// Start an empty conversation.
    ///
    /// `inventory` is read once per send; the session never writes it.
    pub fn new(
        assistant: Arc<dyn Assistant>,
        inventory: watch::Receiver<Arc<Vec<InventoryItem>>>,
    ) -> Self {
        let (transcript, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            assistant,
            inventory,
            transcript,
            busy: AtomicBool::new(false),
            max_message_length: ChatConfig::default().max_message_length,
        }
    }

    pub fn with_max_message_length(mut self, limit: usize) -> Self {
        self.max_message_length = limit;
        self
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Transcript> {
        self.transcript.subscribe()
    }

    /// Whether a reply is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Send one message and wait for the reply.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let length = text.chars().count();
        if length > self.max_message_length {
            warn!(length, limit = self.max_message_length, "Chat message too long");
            return SendOutcome::TooLong(self.max_message_length);
        }
        let Some(mut in_flight) = InFlight::acquire(self) else {
            debug!("Chat send rejected: reply already in flight");
            return SendOutcome::Busy;
        };

        let pending = ChatEntry::pending();
        let pending_id = pending.id;
        let mut history = Vec::new();
        self.transcript.send_modify(|entries| {
            let mut next = Vec::with_capacity(entries.len() + 2);
            next.extend_from_slice(entries);
            next.push(ChatEntry::user(text));
            history = next.iter().map(ChatEntry::to_message).collect();
            next.push(pending);
            *entries = Arc::new(next);
        });
        in_flight.pending = Some(pending_id);

        let request = ChatRequest {
            message: text.to_string(),
            inventory: self.inventory.borrow().as_ref().clone(),
            history,
        };
        info!(
            inventory = request.inventory.len(),
            history = request.history.len(),
            "Sending chat message"
        );

        let outcome = match self.assistant.reply(&request).await {
            Ok(reply) => {
                self.resolve(pending_id, EntryBody::Final(reply.clone()));
                SendOutcome::Replied(reply)
            }
            Err(e) => {
                warn!(error = %e, "Assistant reply failed");
                self.resolve(pending_id, EntryBody::Failed(e.to_string()));
                SendOutcome::Failed(e)
            }
        };
        in_flight.finish();
        outcome
    }

    /// Start over with an empty transcript. Refused while a reply is pending.
    pub fn clear(&self) -> Result<(), ChatError> {
        let Some(in_flight) = InFlight::acquire(self) else {
            return Err(ChatError::Busy);
        };
        self.transcript.send_replace(Arc::new(Vec::new()));
        in_flight.finish();
        info!("Chat transcript cleared");
        Ok(())
    }

    /// Replace the pending entry `id` with `body`. No-op if it is gone.
    fn resolve(&self, id: Uuid, body: EntryBody) {
        self.transcript.send_if_modified(|entries| {
            let Some(index) = entries.iter().position(|e| e.id == id && e.is_pending()) else {
                return false;
            };
            let mut next = entries.as_ref().clone();
            next[index].body = body;
            *entries = Arc::new(next);
            true
        });
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("entries", &self.transcript.borrow().len())
            .field("busy", &self.is_busy())
            .finish()
    }
}
