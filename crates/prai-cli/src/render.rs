use chrono::Local;
use prai_core::{ClientProfile, Message, Role};

pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "prai",
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    format!("[{time}] {who}: {}", message.content)
}

pub fn format_history(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "(no messages yet)".to_string();
    }
    messages
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per client; the active one is starred.
pub fn format_client_list(clients: &[ClientProfile], active: &str) -> String {
    clients
        .iter()
        .map(|c| {
            let marker = if c.id == active { "*" } else { " " };
            format!("{marker} {:<6} {}", c.id, c.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn prompt_label(active: &str, busy: bool) -> String {
    if busy {
        format!("[{active}] ... ")
    } else {
        format!("[{active}] > ")
    }
}
