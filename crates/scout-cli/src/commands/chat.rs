//! Interactive chat loop

use std::future::Future;

use anyhow::{bail, Result};

use scout_protocol::ChatMessage;

use super::connect::establish;
use super::input::LineInput;
use super::models::{resolve_model, show_models};
use super::prompt::{stream_reply, Reply};
use super::Settings;
use crate::output::{print_error, print_info};

/// A line typed at the chat prompt
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Models,
    Reconnect,
    Clear,
    Prompt(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let is = |word: &str| line.eq_ignore_ascii_case(word);

        if line.is_empty() {
            Command::Empty
        } else if is("quit") || is("exit") || is("bye") {
            Command::Quit
        } else if is("models") {
            Command::Models
        } else if is("reconnect") {
            Command::Reconnect
        } else if is("clear") {
            Command::Clear
        } else {
            Command::Prompt(line)
        }
    }
}

/// Run `task` unless `interrupt` completes first
///
/// Once a reply has been streamed the process keeps a Ctrl-C handler, so
/// long waits in the loop have to listen for it themselves.
async fn interruptible<T, I>(task: impl Future<Output = Result<T>>, interrupt: I) -> Result<T>
where
    I: Future,
{
    tokio::select! {
        result = task => result,
        _ = interrupt => {
            println!();
            bail!("Interrupted")
        }
    }
}

/// Execute the chat command
///
/// With `history`, earlier turns are sent along with each prompt.
pub async fn chat_command(settings: &Settings, history: bool) -> Result<()> {
    let mut manager = settings.session_manager();
    let mut input = LineInput::stdin();
    establish(&mut manager, settings.host.as_deref(), &mut input).await?;

    let mut model = resolve_model(&manager, &settings.model).await;
    print_info(&format!("Using model {}", model));
    println!("Commands: 'models', 'reconnect', 'clear', 'quit'. Ctrl-C stops a reply.\n");

    let mut conversation: Vec<ChatMessage> = Vec::new();
    while let Some(line) = input.read_line("You: ").await? {
        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Models => {
                let listed = interruptible(show_models(&manager, &model), tokio::signal::ctrl_c());
                if let Err(e) = listed.await {
                    print_error(&format!("Failed to list models: {}", e));
                }
            }
            Command::Reconnect => {
                let reconnect = async {
                    establish(&mut manager, None, &mut input).await?;
                    Ok::<_, anyhow::Error>(resolve_model(&manager, &model).await)
                };
                let reconnected = interruptible(reconnect, tokio::signal::ctrl_c()).await;
                match reconnected {
                    Ok(resolved) => model = resolved,
                    Err(e) => print_error(&e.to_string()),
                }
            }
            Command::Clear => {
                conversation.clear();
                print_info("Conversation cleared");
            }
            Command::Prompt(text) => {
                print!("Ollama: ");
                let reply = if history {
                    conversation.push(ChatMessage::user(text));
                    Reply::Chat(settings.chat_request(&model, &conversation))
                } else {
                    Reply::Generate(settings.generate_request(&model, text))
                };

                match stream_reply(&mut manager, reply).await {
                    Ok(result) => {
                        if let Some(error) = &result.error {
                            print_error(&format!("Reply ended early: {}", error));
                        }
                        if history {
                            record_reply(&mut conversation, &result.full_text);
                        }
                    }
                    Err(e) => {
                        print_error(&e.to_string());
                        if history {
                            conversation.pop();
                        }
                    }
                }
                println!();
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Keep the assistant's turn, or drop the unanswered user turn
fn record_reply(conversation: &mut Vec<ChatMessage>, reply: &str) {
    if reply.is_empty() {
        conversation.pop();
    } else {
        conversation.push(ChatMessage::assistant(reply));
    }
}
