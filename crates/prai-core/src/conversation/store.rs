use super::message::{ClientProfile, Conversations, Message};
use super::storage::KeyValueStore;
use crate::config::CorruptStatePolicy;
use crate::error::Result;

/// Slot holding the serialized client -> history mapping.
pub const DEFAULT_STORAGE_KEY: &str = "prai_chat_by_client";

/// Result of reading the persisted mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration {
    /// Nothing has been persisted yet (first run).
    Missing,
    /// The slot held a well-formed mapping.
    Restored(Conversations),
    /// The slot held malformed data and was ignored.
    Discarded,
    /// Reading the slot failed; its content is unknown and left in place.
    Unreadable,
}

impl Hydration {
    pub fn into_conversations(self) -> Conversations {
        match self {
            Hydration::Restored(conversations) => conversations,
            Hydration::Missing | Hydration::Discarded | Hydration::Unreadable => {
                Conversations::new()
            }
        }
    }
}

/// Bridges the in-memory mapping and durable storage. Holds no mapping of
/// its own: callers own the current value and hand it in explicitly.
pub struct ConversationStore {
    storage: Box<dyn KeyValueStore>,
    key: String,
}

impl ConversationStore {
    pub fn new(storage: impl KeyValueStore + 'static) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            storage: Box::new(storage),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted mapping. Failures are reported and never raised.
    pub fn hydrate(&self) -> Hydration {
        let bytes = match self.storage.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Hydration::Missing,
            Err(e) => {
                tracing::warn!("Chat history slot '{}' unreadable: {}", self.key, e);
                return Hydration::Unreadable;
            }
        };

        match serde_json::from_slice::<Conversations>(&bytes) {
            Ok(conversations) => {
                tracing::debug!(
                    "Hydrated {} client histories from '{}'",
                    conversations.len(),
                    self.key
                );
                Hydration::Restored(conversations)
            }
            Err(e) => {
                tracing::warn!("Discarding malformed chat history in '{}': {}", self.key, e);
                Hydration::Discarded
            }
        }
    }

    /// Return a copy of `conversations` with `message` appended to
    /// `client_id`'s history, creating the history if absent.
    pub fn append(conversations: &Conversations, client_id: &str, message: Message) -> Conversations {
        let mut next = conversations.clone();
        next.entry(client_id.to_string()).or_default().push(message);
        next
    }

    /// Serialize the full mapping and replace the slot's content.
    pub fn persist(&self, conversations: &Conversations) -> Result<()> {
        let bytes = serde_json::to_vec(conversations)?;
        self.storage.set(&self.key, &bytes)
    }

    /// One assistant welcome message per client.
    pub fn seed(clients: &[ClientProfile], welcome: &str) -> Conversations {
        clients
            .iter()
            .map(|c| (c.id.clone(), vec![Message::welcome(&c.id, welcome)]))
            .collect()
    }

    /// Startup path: hydrate, seed on first run, make sure every known
    /// client has an entry, then write the result back. A slot that could
    /// not be read is never written here.
    pub fn load(
        &self,
        clients: &[ClientProfile],
        policy: CorruptStatePolicy,
        welcome: &str,
    ) -> Conversations {
        let hydration = self.hydrate();
        let write_back = hydration != Hydration::Unreadable;

        let mut conversations = match hydration {
            Hydration::Missing => Self::seed(clients, welcome),
            Hydration::Restored(conversations) => conversations,
            Hydration::Discarded | Hydration::Unreadable => match policy {
                CorruptStatePolicy::StartEmpty => Conversations::new(),
                CorruptStatePolicy::Reseed => Self::seed(clients, welcome),
            },
        };

        for client in clients {
            conversations.entry(client.id.clone()).or_default();
        }

        if write_back {
            if let Err(e) = self.persist(&conversations) {
                tracing::warn!("Failed to persist chat history after load: {}", e);
            }
        }

        conversations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::message::Role;
    use crate::conversation::storage::MemoryStore;
    use crate::error::PraiError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Wraps a MemoryStore; the first `get` fails.
    struct FlakyReadStore {
        inner: MemoryStore,
        failed: AtomicBool,
    }

    impl KeyValueStore for FlakyReadStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(PraiError::storage("device busy"));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.inner.set(key, value)
        }
    }

    /// Reads work, every write fails.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
            Err(PraiError::storage("read-only file system"))
        }
    }

    fn clients() -> Vec<ClientProfile> {
        vec![
            ClientProfile::new("c1", "Client A"),
            ClientProfile::new("c2", "Client B"),
        ]
    }

    #[test]
    fn test_hydrate_missing_slot() {
        let store = ConversationStore::new(MemoryStore::new());
        assert_eq!(store.hydrate(), Hydration::Missing);
        assert!(store.hydrate().into_conversations().is_empty());
    }

    #[test]
    fn test_hydrate_malformed_slot_is_discarded() {
        let store = ConversationStore::new(MemoryStore::with_slot(DEFAULT_STORAGE_KEY, "{not json"));
        assert_eq!(store.hydrate(), Hydration::Discarded);
        assert!(store.hydrate().into_conversations().is_empty());
    }

    #[test]
    fn test_hydrate_wrong_shape_is_discarded() {
        let store = ConversationStore::new(MemoryStore::with_slot(
            DEFAULT_STORAGE_KEY,
            r#"{"c1": [{"id": "x", "role": "robot", "content": "hi"}]}"#,
        ));
        assert_eq!(store.hydrate(), Hydration::Discarded);
    }

    #[test]
    fn test_persist_then_hydrate_preserves_order_and_content() {
        let store = ConversationStore::new(MemoryStore::new());
        let mut conversations = Conversations::new();
        conversations = ConversationStore::append(&conversations, "c1", Message::user("one"));
        conversations = ConversationStore::append(&conversations, "c1", Message::assistant("two"));
        conversations = ConversationStore::append(&conversations, "c2", Message::user("three"));

        store.persist(&conversations).unwrap();
        let restored = store.hydrate().into_conversations();
        assert_eq!(restored, conversations);

        store.persist(&restored).unwrap();
        assert_eq!(store.hydrate().into_conversations(), conversations);
    }

    #[test]
    fn test_append_is_pure_and_creates_history() {
        let original = ConversationStore::seed(&clients(), "Welcome");
        let next = ConversationStore::append(&original, "c3", Message::user("new client"));

        assert!(!original.contains_key("c3"));
        assert_eq!(next["c3"].len(), 1);
        assert_eq!(next["c1"], original["c1"]);
        assert_eq!(next["c2"], original["c2"]);
    }

    #[test]
    fn test_append_keeps_existing_order() {
        let first = Message::user("first");
        let second = Message::assistant("second");
        let conversations = ConversationStore::append(&Conversations::new(), "c1", first.clone());
        let conversations = ConversationStore::append(&conversations, "c1", second.clone());

        assert_eq!(conversations["c1"], vec![first, second]);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let a = ConversationStore::seed(&clients(), "Welcome");
        let b = ConversationStore::seed(&clients(), "Welcome");

        for id in ["c1", "c2"] {
            assert_eq!(a[id].len(), 1);
            assert_eq!(a[id][0].id, b[id][0].id);
            assert_eq!(a[id][0].content, b[id][0].content);
            assert_eq!(a[id][0].role, Role::Assistant);
        }
    }

    #[test]
    fn test_load_seeds_and_persists_on_first_run() {
        let storage = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(storage.clone());

        let conversations = store.load(&clients(), CorruptStatePolicy::StartEmpty, "Welcome");
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations["c1"][0].id, "seed-c1");
        assert!(storage.get(DEFAULT_STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_load_restores_without_reseeding() {
        let storage = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(storage.clone());
        let saved = ConversationStore::append(&Conversations::new(), "c1", Message::user("kept"));
        store.persist(&saved).unwrap();

        let conversations = store.load(&clients(), CorruptStatePolicy::Reseed, "Welcome");
        assert_eq!(conversations["c1"], saved["c1"]);
        // Known client missing from the slot gets an empty history.
        assert!(conversations["c2"].is_empty());
    }

    #[test]
    fn test_load_corrupt_starts_empty() {
        let store = ConversationStore::new(MemoryStore::with_slot(DEFAULT_STORAGE_KEY, "garbage"));

        let conversations = store.load(&clients(), CorruptStatePolicy::StartEmpty, "Welcome");
        assert!(conversations["c1"].is_empty());
        assert!(conversations["c2"].is_empty());
        // The corrupt slot has been overwritten with a readable mapping.
        assert!(matches!(store.hydrate(), Hydration::Restored(_)));
    }

    #[test]
    fn test_load_corrupt_reseeds_when_configured() {
        let store = ConversationStore::new(MemoryStore::with_slot(DEFAULT_STORAGE_KEY, "garbage"));

        let conversations = store.load(&clients(), CorruptStatePolicy::Reseed, "Welcome");
        assert_eq!(conversations["c1"].len(), 1);
        assert_eq!(conversations["c2"][0].id, "seed-c2");
    }

    #[test]
    fn test_custom_key() {
        let storage = Arc::new(MemoryStore::new());
        let store = ConversationStore::with_key(storage.clone(), "other_slot");
        store.persist(&Conversations::new()).unwrap();

        assert_eq!(store.key(), "other_slot");
        assert!(storage.get("other_slot").unwrap().is_some());
        assert!(storage.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_read_error_is_unreadable_not_discarded() {
        let store = ConversationStore::new(FlakyReadStore {
            inner: MemoryStore::new(),
            failed: AtomicBool::new(false),
        });
        assert_eq!(store.hydrate(), Hydration::Unreadable);
        assert_eq!(store.hydrate(), Hydration::Missing);
    }

    #[test]
    fn test_load_after_read_error_keeps_slot() {
        let saved = ConversationStore::append(&Conversations::new(), "c1", Message::user("precious"));
        let inner = MemoryStore::new();
        inner
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_vec(&saved).unwrap())
            .unwrap();
        let storage = Arc::new(FlakyReadStore {
            inner,
            failed: AtomicBool::new(false),
        });
        let store = ConversationStore::new(storage.clone());

        let conversations = store.load(&clients(), CorruptStatePolicy::StartEmpty, "Welcome");
        assert!(conversations["c1"].is_empty());

        // The next read sees the untouched history.
        let restored = store.hydrate().into_conversations();
        assert_eq!(restored["c1"], saved["c1"]);
    }

    #[test]
    fn test_load_survives_failed_write_back() {
        let store = ConversationStore::new(ReadOnlyStore(MemoryStore::new()));

        let conversations = store.load(&clients(), CorruptStatePolicy::StartEmpty, "Welcome");
        assert_eq!(conversations["c1"][0].id, "seed-c1");
        assert_eq!(conversations["c2"][0].id, "seed-c2");
        assert_eq!(store.hydrate(), Hydration::Missing);
    }
}
