pub mod error;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod session;

// Re-export key types
pub use error::PraiError;
pub use backend::{ChatBackend, ChatOutcome, ChatRequest, HttpChatBackend};
pub use config::{CorruptStatePolicy, Settings};
pub use conversation::{
    ActiveClient, ChatEvent, ClientId, ClientProfile, ConversationStore, Conversations,
    Dispatcher, FileStore, Hydration, KeyValueStore, MemoryStore, Message, Role, SendReceipt,
};
pub use session::ChatSession;
