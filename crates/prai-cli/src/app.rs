use anyhow::Result;
use prai_cli::render::{format_client_list, format_history, format_message, prompt_label};
use prai_cli::{handle_command, CommandResult};
use prai_core::{ChatEvent, ChatSession};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Send one message to the active client, print the reply, and exit.
pub async fn run_single_prompt(session: &ChatSession, prompt: &str) -> Result<()> {
    match session.send(prompt).await {
        Some(receipt) => println!("{}", receipt.assistant.content),
        None => anyhow::bail!("Nothing to send: the prompt is empty"),
    }
    Ok(())
}

pub async fn run_repl(session: &ChatSession) -> Result<()> {
    print_header(session);
    println!("{}", format_history(&session.active_history()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", prompt_label(&session.active(), session.is_busy()));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match handle_command(&line) {
            CommandResult::Quit => break,
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::ListClients => {
                println!("{}", format_client_list(session.clients(), &session.active()))
            }
            CommandResult::SelectClient(id) => {
                if !session.clients().iter().any(|c| c.id == id) {
                    println!("Note: '{id}' is not a configured client; starting an empty history.");
                }
                session.select(id);
                print_header(session);
                println!("{}", format_history(&session.active_history()));
            }
            CommandResult::ShowHistory => {
                println!("{}", format_history(&session.active_history()))
            }
            CommandResult::ShowStatus => {
                let name = session
                    .active_profile()
                    .map(|c| c.name.as_str())
                    .unwrap_or("(unlisted client)");
                println!(
                    "Agency: {}\nActive client: {} ({})\nMessages: {}\nBusy: {}",
                    session.agency(),
                    session.active(),
                    name,
                    session.active_history().len(),
                    session.is_busy()
                );
            }
            CommandResult::NotACommand => send_and_render(session, &line).await,
        }
    }

    Ok(())
}

fn print_header(session: &ChatSession) {
    let title = session
        .active_profile()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| session.active());
    println!("Agency: {}", session.agency());
    println!("== {title} ==");
    println!("Single chat history scoped to this client.");
}

async fn send_and_render(session: &ChatSession, text: &str) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let render = async move {
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Sending { client_id } => {
                    print!("{}", prompt_label(&client_id, true));
                    let _ = std::io::stdout().flush();
                }
                ChatEvent::AssistantMessage { message, .. } => {
                    println!("\r{}", format_message(&message));
                }
                ChatEvent::UserMessage { .. } | ChatEvent::Idle => {}
            }
        }
    };

    let (receipt, ()) = tokio::join!(session.send_with_events(text, tx), render);
    if receipt.is_none() {
        tracing::debug!("Ignored empty input");
    }
}
