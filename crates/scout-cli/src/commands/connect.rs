//! Server connection with manual address fallback

use anyhow::{anyhow, Result};
use tokio::io::AsyncBufRead;

use scout_client::{Probe, SessionError, SessionManager};

use super::input::LineInput;
use crate::output::{print_error, print_info, print_success};

const ADDRESS_PROMPT: &str = "Server address ('scan' to search again, empty to quit): ";

/// Connect `manager` to a server
///
/// Uses `host` when given, discovery otherwise. When that fails and
/// `input` is a terminal, the user is asked for an address until one
/// answers or they give up.
pub async fn establish<P, R>(
    manager: &mut SessionManager<P>,
    host: Option<&str>,
    input: &mut LineInput<R>,
) -> Result<()>
where
    P: Probe,
    R: AsyncBufRead + Unpin,
{
    let port = manager.preferences().port();
    match host {
        Some(host) => print_info(&format!("Connecting to {}:{}...", host, port)),
        None => print_info("Searching for an Ollama server..."),
    }

    let err = match manager.connect(host).await {
        Ok(session) => {
            print_success(&format!("Connected to {}", session));
            return Ok(());
        }
        Err(SessionError::Discovery(e)) => e,
        Err(e) => return Err(e.into()),
    };
    print_error(&err.to_string());

    if !input.is_terminal() {
        print_tips(host.unwrap_or("localhost"), port);
        return Err(anyhow!(err));
    }

    loop {
        let Some(entry) = input.read_line(ADDRESS_PROMPT).await? else {
            return Err(anyhow!("No server selected"));
        };

        let result = match entry.as_str() {
            "" => return Err(anyhow!("No server selected")),
            "scan" => {
                print_info("Searching for an Ollama server...");
                manager.connect(None).await
            }
            address => manager.connect(Some(address)).await,
        };

        match result {
            Ok(session) => {
                print_success(&format!("Connected to {}", session));
                return Ok(());
            }
            Err(SessionError::Discovery(e)) => print_error(&e.to_string()),
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_tips(host: &str, port: u16) {
    eprintln!();
    eprintln!("Troubleshooting tips:");
    eprintln!("  1. Make sure Ollama is running: ollama serve");
    eprintln!("  2. Let it accept network connections: OLLAMA_HOST=0.0.0.0:{}", port);
    eprintln!("  3. Check the server's firewall allows port {}", port);
    eprintln!("  4. Test manually: curl http://{}:{}/api/tags", host, port);
    eprintln!("  5. Pin the address with --host or 'ollama-scout config set FORCE_IP <addr>'");
}
