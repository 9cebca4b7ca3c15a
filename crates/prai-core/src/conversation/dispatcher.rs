use super::message::{ClientId, Conversations, Message};
use super::store::ConversationStore;
use crate::backend::{ChatBackend, ChatRequest, FALLBACK_UNREACHABLE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

/// Events emitted during a send cycle, in this order.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    UserMessage { client_id: ClientId, message: Message },
    Sending { client_id: ClientId },
    AssistantMessage { client_id: ClientId, message: Message },
    Idle,
}

/// The pair of messages one completed send cycle appended.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub client_id: ClientId,
    pub user: Message,
    pub assistant: Message,
}

/// Owns the current mapping and runs send cycles against it.
pub struct Dispatcher {
    store: ConversationStore,
    backend: Box<dyn ChatBackend>,
    conversations: Mutex<Conversations>,
    in_flight: AtomicUsize,
}

/// Counts one cycle as in flight until dropped. A cycle dropped before its
/// reply was committed gets the unreachable fallback, so no user message is
/// left unanswered.
struct CycleGuard<'a> {
    dispatcher: &'a Dispatcher,
    client_id: &'a str,
    answered: bool,
}

impl<'a> CycleGuard<'a> {
    fn enter(dispatcher: &'a Dispatcher, client_id: &'a str) -> Self {
        dispatcher.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            dispatcher,
            client_id,
            answered: false,
        }
    }

    fn answer(&mut self, content: String) -> Message {
        let assistant = Message::assistant(content);
        self.dispatcher.commit(self.client_id, assistant.clone());
        self.answered = true;
        assistant
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.answered {
            tracing::warn!("Send cycle for {} abandoned before a reply", self.client_id);
            self.dispatcher.commit(
                self.client_id,
                Message::assistant(FALLBACK_UNREACHABLE),
            );
        }
        self.dispatcher.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dispatcher {
    pub fn new(
        store: ConversationStore,
        backend: Box<dyn ChatBackend>,
        conversations: Conversations,
    ) -> Self {
        Self {
            store,
            backend,
            conversations: Mutex::new(conversations),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Run one send cycle, returning the appended pair. Whitespace-only
    /// input is a no-op and returns `None`. Dropping the future after the
    /// user message was committed still appends the unreachable fallback.
    pub async fn send(&self, client_id: &str, text: &str) -> Option<SendReceipt> {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.send_with_events(client_id, text, tx).await
    }

    /// Run one send cycle, emitting ChatEvents through the channel.
    pub async fn send_with_events(
        &self,
        client_id: &str,
        text: &str,
        event_tx: UnboundedSender<ChatEvent>,
    ) -> Option<SendReceipt> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user = Message::user(text);
        self.commit(client_id, user.clone());
        let _ = event_tx.send(ChatEvent::UserMessage {
            client_id: client_id.to_string(),
            message: user.clone(),
        });

        let assistant = {
            let mut cycle = CycleGuard::enter(self, client_id);
            let _ = event_tx.send(ChatEvent::Sending {
                client_id: client_id.to_string(),
            });

            let request = ChatRequest::new(client_id, text);
            let outcome = self.backend.chat(&request).await;
            tracing::debug!("Send cycle for {} finished: {:?}", client_id, outcome);

            cycle.answer(outcome.into_content())
        };

        let _ = event_tx.send(ChatEvent::AssistantMessage {
            client_id: client_id.to_string(),
            message: assistant.clone(),
        });
        let _ = event_tx.send(ChatEvent::Idle);

        Some(SendReceipt {
            client_id: client_id.to_string(),
            user,
            assistant,
        })
    }

    /// Append and persist under one lock so snapshots hit storage in
    /// commit order. Never held across an await.
    fn commit(&self, client_id: &str, message: Message) {
        let mut current = self.lock_conversations();
        let next = ConversationStore::append(&current, client_id, message);
        if let Err(e) = self.store.persist(&next) {
            tracing::warn!("Failed to persist chat history for {}: {}", client_id, e);
        }
        *current = next;
    }

    fn lock_conversations(&self) -> MutexGuard<'_, Conversations> {
        // A panic elsewhere must not wedge the chat.
        self.conversations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every client's history.
    pub fn conversations(&self) -> Conversations {
        self.lock_conversations().clone()
    }

    /// One client's history; empty for ids with no entry.
    pub fn history(&self, client_id: &str) -> Vec<Message> {
        self.lock_conversations()
            .get(client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    /// Number of send cycles currently waiting on the backend.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}
