use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partition key for conversation history.
pub type ClientId = String;

/// Every client's history, keyed by client id. Each sequence is in
/// chronological (insertion) order.
pub type Conversations = BTreeMap<ClientId, Vec<Message>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant greeting for a client with no history. The id is derived
    /// from the client id so seeding the same client twice yields the same id.
    pub fn welcome(client_id: &str, content: impl Into<String>) -> Self {
        Self {
            id: format!("seed-{}", client_id),
            ..Self::assistant(content)
        }
    }
}

/// A selectable client context. Identity is the `id`; `name` is display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: ClientId,
    pub name: String,
}

impl ClientProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for ClientProfile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientProfile {}
