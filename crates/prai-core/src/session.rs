//! Host-facing facade: the configured clients, which one is focused, and
//! the dispatcher holding every client's history.

use crate::backend::{ChatBackend, HttpChatBackend};
use crate::config::Settings;
use crate::conversation::{
    ActiveClient, ChatEvent, ClientId, ClientProfile, ConversationStore, Dispatcher, FileStore,
    KeyValueStore, Message, SendReceipt,
};
use crate::error::Result;
use tokio::sync::mpsc::UnboundedSender;

pub struct ChatSession {
    agency: String,
    clients: Vec<ClientProfile>,
    active: ActiveClient,
    dispatcher: Dispatcher,
}

impl ChatSession {
    /// Build a session from settings: file-backed history and the HTTP backend.
    pub fn open(settings: &Settings) -> Result<Self> {
        let storage = match &settings.storage.dir {
            Some(dir) => FileStore::with_dir(dir)?,
            None => FileStore::new()?,
        };
        let backend = HttpChatBackend::from_settings(&settings.api)?;
        tracing::info!(
            "Opening chat session (history in {}, backend {})",
            storage.base_dir().display(),
            backend.chat_url()
        );
        Ok(Self::with_parts(settings, storage, Box::new(backend)))
    }

    /// Build a session over any storage and backend. Hydrates (or seeds)
    /// history for the configured clients.
    pub fn with_parts(
        settings: &Settings,
        storage: impl KeyValueStore + 'static,
        backend: Box<dyn ChatBackend>,
    ) -> Self {
        let store = ConversationStore::with_key(storage, settings.storage.key.clone());
        let conversations = store.load(
            &settings.clients,
            settings.chat.corrupt_state,
            &settings.chat.welcome_message,
        );

        Self {
            agency: settings.chat.agency.clone(),
            clients: settings.clients.clone(),
            active: ActiveClient::new(&settings.clients),
            dispatcher: Dispatcher::new(store, backend, conversations),
        }
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn clients(&self) -> &[ClientProfile] {
        &self.clients
    }

    pub fn select(&self, client_id: impl Into<ClientId>) {
        self.active.select(client_id);
    }

    pub fn active(&self) -> ClientId {
        self.active.current()
    }

    /// Profile of the focused client, if it is one of the configured ones.
    pub fn active_profile(&self) -> Option<&ClientProfile> {
        let id = self.active();
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn active_history(&self) -> Vec<Message> {
        self.dispatcher.history(&self.active())
    }

    pub fn history(&self, client_id: &str) -> Vec<Message> {
        self.dispatcher.history(client_id)
    }

    /// Send to whichever client is focused when the call starts.
    pub async fn send(&self, text: &str) -> Option<SendReceipt> {
        let client_id = self.active();
        self.dispatcher.send(&client_id, text).await
    }

    pub async fn send_with_events(
        &self,
        text: &str,
        event_tx: UnboundedSender<ChatEvent>,
    ) -> Option<SendReceipt> {
        let client_id = self.active();
        self.dispatcher
            .send_with_events(&client_id, text, event_tx)
            .await
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
