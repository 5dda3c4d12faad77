//! Models command implementation

use anyhow::Result;

use scout_client::{select_model, Probe, SessionManager};

use super::connect::establish;
use super::input::LineInput;
use super::Settings;
use crate::output::{format_models, print_info, print_warning};

/// Execute the models command
pub async fn models_command(settings: &Settings) -> Result<()> {
    let mut manager = settings.session_manager();
    let mut input = LineInput::stdin();
    establish(&mut manager, settings.host.as_deref(), &mut input).await?;

    show_models(&manager, &settings.model).await
}

/// Print the server's models, marking the one `requested` resolves to
pub async fn show_models<P: Probe>(manager: &SessionManager<P>, requested: &str) -> Result<()> {
    let models = manager.list_models().await?;
    let selection = select_model(requested, &models);
    let selected = (!selection.fell_back).then_some(selection.model.as_str());

    println!("{}", format_models(&models, selected));
    Ok(())
}

/// Pick the model to use on the connected server
///
/// Falls back to the first listed model when `requested` is not served.
/// If the list cannot be fetched the request is used as is.
pub async fn resolve_model<P: Probe>(manager: &SessionManager<P>, requested: &str) -> String {
    let models = match manager.list_models().await {
        Ok(models) => models,
        Err(e) => {
            tracing::warn!("Could not list models: {}", e);
            return requested.to_string();
        }
    };

    let selection = select_model(requested, &models);
    if selection.fell_back {
        print_warning(&format!("Model '{}' not found on server", requested));
        println!("{}", format_models(&models, Some(&selection.model)));
        print_info(&format!("Using '{}' instead", selection.model));
    }
    selection.model
}
