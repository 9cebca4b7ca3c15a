use super::message::{ClientId, ClientProfile};
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Tracks the one focused client. Membership in the known client list is
/// not enforced: an unknown id simply has an empty history.
pub struct ActiveClient {
    focus: RwLock<ClientId>,
    changes_tx: broadcast::Sender<ClientId>,
}

impl ActiveClient {
    /// Focus starts on the first client in `clients`.
    pub fn new(clients: &[ClientProfile]) -> Self {
        let initial = clients.first().map(|c| c.id.clone()).unwrap_or_default();
        Self::with_focus(initial)
    }

    pub fn with_focus(client_id: impl Into<ClientId>) -> Self {
        let (changes_tx, _) = broadcast::channel(128);
        Self {
            focus: RwLock::new(client_id.into()),
            changes_tx,
        }
    }

    pub fn select(&self, client_id: impl Into<ClientId>) {
        let client_id = client_id.into();
        tracing::debug!("Active client -> {}", client_id);
        {
            let mut focus = self.focus.write().unwrap_or_else(|e| e.into_inner());
            *focus = client_id.clone();
        }
        // No subscribers is fine.
        let _ = self.changes_tx.send(client_id);
    }

    pub fn current(&self) -> ClientId {
        self.focus.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Receiver notified with the new id on every `select`.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientId> {
        self.changes_tx.subscribe()
    }
}
