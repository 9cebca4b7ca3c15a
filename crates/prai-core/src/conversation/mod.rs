mod message;
mod storage;
mod store;
mod selector;
pub mod dispatcher;

pub use message::{ClientId, ClientProfile, Conversations, Message, Role};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ConversationStore, Hydration, DEFAULT_STORAGE_KEY};
pub use selector::ActiveClient;
pub use dispatcher::{ChatEvent, Dispatcher, SendReceipt};
