#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use super::render;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::services::ConversationSession;
use crate::infrastructure::backends::BackendManager;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /focus (/f, /graph) [MESSAGE_NUMBER?] - Opens the performance graph attached to a message. Without a number, the most recent graph is opened.
- /close (/x) - Closes the open graph.
- /reset (/clear) - Starts the conversation over.
- /help (/h) - Provides this help menu.
- /quit /exit (/q) - Exit QueryLens.

TIPS:
- Ask about a specific query with "query N", for example "why is query 3 slow?".
- Ask for a graph with "show graph for query N".
        "#;

    return text.trim().to_string();
}

async fn print_prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    return Ok(());
}

fn focus(session: &mut ConversationSession, command: &SlashCommand) {
    let index = match command.index_arg() {
        Some(number) if number > 0 => Some(number - 1),
        Some(_) => None,
        None => session.latest_graph_index(),
    };

    let already_open = index
        .and_then(|index| return session.messages().get(index))
        .and_then(|message| return message.query_id())
        .map(|query_id| return session.is_focused(query_id))
        .unwrap_or(false);
    if already_open {
        println!("That graph is already open.");
        return;
    }

    let focused = index
        .map(|index| return session.focus_message(index))
        .unwrap_or(false);
    if !focused {
        println!("There is no graph to open for that message.");
        return;
    }

    if let Some(artifact) = session.focused_artifact() {
        println!(
            "Graph for query {}: {}",
            artifact.query_id,
            Paint::new(&artifact.graph_ref).underline()
        );
    }
}

/// Handles one line of input. Returns false once the user asks to quit.
fn handle_line(session: &mut ConversationSession, line: &str) -> bool {
    if let Some(command) = SlashCommand::parse(line) {
        if command.is_quit() {
            return false;
        }
        if command.is_help() {
            println!("{}", help_text());
        } else if command.is_focus() {
            focus(session, &command);
        } else if command.is_close() {
            session.clear_focus();
            println!("Closed the graph.");
        } else if command.is_reset() {
            if session.reset() {
                println!("Started a new conversation.");
            } else {
                println!("Wait for the current reply before starting over.");
            }
        }

        return true;
    }

    session.push_input(line);
    if session.submit_input() {
        println!("{}", Paint::yellow("Thinking..."));
    } else if session.is_awaiting_response() {
        println!("{}", Paint::yellow("Still waiting on the last reply..."));
    }
    session.input.clear();

    return true;
}

/// Runs the interactive chat until stdin closes or the user quits. Requests
/// leave through `tx`; their outcomes arrive on `rx`.
pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut session = ConversationSession::new(tx);
    let mut messages = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Hey {}! Ask me about your schema, performance, or a specific query. Type /help for commands.",
        Config::get(ConfigKey::Username)
    );
    if let Err(err) = BackendManager::get().health_check().await {
        println!(
            "{}",
            Paint::red(format!(
                "The analysis service at {} isn't reachable yet. Replies will fail until it is running.\n\nError: {err}",
                Config::get(ConfigKey::ApiURL)
            ))
        );
    }
    print_prompt().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut session, &line) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(event) = rx.recv() => {
                session.handle_event(event);
            }
        }

        while let Ok(message) = messages.try_recv() {
            if message.role == Role::User {
                continue;
            }
            println!("{}", render::message(session.messages().len(), &message));
        }

        if !session.is_awaiting_response() {
            print_prompt().await?;
        }
    }

    return Ok(());
}
