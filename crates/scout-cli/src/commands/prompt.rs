//! Prompt command implementation

use std::io::Write;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use scout_client::{Probe, SessionManager};
use scout_protocol::{ChatRequest, GenerateRequest, GenerationResult};

use super::connect::establish;
use super::input::LineInput;
use super::models::resolve_model;
use super::Settings;
use crate::output::print_warning;

/// Execute the prompt command: one streamed reply, then exit
pub async fn prompt_command(settings: &Settings, text: &str) -> Result<()> {
    let mut manager = settings.session_manager();
    let mut input = LineInput::stdin();
    establish(&mut manager, settings.host.as_deref(), &mut input).await?;

    let model = resolve_model(&manager, &settings.model).await;
    tracing::info!("Prompting {} with {} chars", model, text.len());

    let request = settings.generate_request(&model, text);
    let result = stream_reply(&mut manager, Reply::Generate(request)).await?;
    if let Some(error) = result.error {
        bail!("Generation failed: {}", error);
    }
    Ok(())
}

/// What to ask the server for
pub(crate) enum Reply {
    Generate(GenerateRequest),
    Chat(ChatRequest),
}

/// Stream a reply to stdout
///
/// Ctrl-C cancels this generation only; the text received so far is kept.
pub(crate) async fn stream_reply<P: Probe>(
    manager: &mut SessionManager<P>,
    reply: Reply,
) -> Result<GenerationResult> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let print = |fragment: &str| {
        print!("{}", fragment);
        let _ = std::io::stdout().flush();
    };
    let result = match reply {
        Reply::Generate(request) => manager.generate(request, cancel, print).await,
        Reply::Chat(request) => manager.chat(request, cancel, print).await,
    };
    watcher.abort();
    println!();

    let result = result?;
    if result.cancelled {
        print_warning("Generation cancelled");
    }
    Ok(result)
}
