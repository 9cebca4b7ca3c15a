/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// List the configured clients.
    ListClients,
    /// Switch the active client.
    SelectClient(String),
    /// Reprint the active client's history.
    ShowHistory,
    /// Show status (active client, backend, busy).
    ShowStatus,
    /// Not a command - send as a chat message.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/clients" | "/ls" => CommandResult::ListClients,
        "/use" | "/client" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /use <client-id>".into())
            } else {
                CommandResult::SelectClient(arg.to_string())
            }
        }
        "/history" => CommandResult::ShowHistory,
        "/status" => CommandResult::ShowStatus,
        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "PRAI Commands:\n\
         \n\
         \x20 /help, /h            Show this help\n\
         \x20 /clients, /ls        List clients\n\
         \x20 /use <client-id>     Switch the active client\n\
         \x20 /history             Show the active client's history\n\
         \x20 /status              Show active client and backend status\n\
         \x20 /quit, /exit, /q     Exit\n\
         \n\
         Anything else is sent to the assistant for the active client."
            .into(),
    )
}
