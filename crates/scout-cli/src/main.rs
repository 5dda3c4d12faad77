//! ollama-scout CLI
//!
//! Finds an Ollama server on the local network and talks to it:
//! - Interactive chat (default)
//! - One-shot prompts
//! - Network scans and model listings
//! - Preference file management

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ollama_scout::commands::{self, Settings};
use scout_client::DEFAULT_MODEL;

#[derive(Parser)]
#[command(name = "ollama-scout")]
#[command(author, version, about = "Find an Ollama server on the local network and chat with it")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the preference file
    #[arg(short, long, global = true, env = "OLLAMA_SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Server address to use instead of discovery
    #[arg(long, global = true, env = "OLLAMA_SCOUT_HOST")]
    host: Option<String>,

    /// Server port for this run (not saved)
    #[arg(
        short,
        long,
        global = true,
        env = "OLLAMA_SCOUT_PORT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    port: Option<u16>,

    /// Model to use
    #[arg(short, long, global = true, env = "OLLAMA_SCOUT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Number of addresses to probe at once during discovery
    #[arg(long, global = true, default_value_t = 1)]
    parallel: usize,

    /// System prompt sent with every request
    #[arg(long, global = true, env = "OLLAMA_SCOUT_SYSTEM")]
    system: Option<String>,

    /// Sampling temperature passed to the model
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the server interactively (default)
    Chat {
        /// Send earlier turns with each prompt
        #[arg(long)]
        history: bool,
    },

    /// Send one prompt and print the reply
    Prompt {
        /// Prompt text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List every reachable server without connecting
    Scan,

    /// List the models of the discovered server
    Models,

    /// Manage the preference file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current preferences
    Show,
    /// Show preference file path
    Path,
    /// Set a value (LAST_IP, FORCE_IP, COMMON_IPS, PORT)
    Set { key: String, value: String },
    /// Reset a value to its default
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = Settings {
        config_path: cli.config,
        host: cli.host,
        port: cli.port,
        model: cli.model,
        parallel: cli.parallel,
        system: cli.system,
        temperature: cli.temperature,
    };

    match cli.command.unwrap_or(Commands::Chat { history: false }) {
        Commands::Chat { history } => commands::chat_command(&settings, history).await,
        Commands::Prompt { text } => commands::prompt_command(&settings, &text.join(" ")).await,
        Commands::Scan => commands::scan_command(&settings).await,
        Commands::Models => commands::models_command(&settings).await,
        Commands::Config { action } => {
            let path = settings.config_path();
            match action {
                ConfigAction::Show => commands::config_show(&path),
                ConfigAction::Path => commands::config_path(&path),
                ConfigAction::Set { key, value } => commands::config_set(&path, &key, &value),
                ConfigAction::Unset { key } => commands::config_unset(&path, &key),
            }
        }
    }
}
