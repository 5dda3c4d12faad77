//! Output formatting utilities for the CLI
//!
//! Tables for models, scan results and preferences, plus colored status
//! messages.

use tabled::{settings::Style, Table, Tabled};

use scout_core::{CandidateHost, ConfigKey, ConnectionConfig, ServerSession};
use scout_protocol::ModelInfo;

/// Format a list of models as an ASCII table
///
/// `selected` marks the model requests will use.
pub fn format_models(models: &[ModelInfo], selected: Option<&str>) -> String {
    if models.is_empty() {
        return "No models available. Pull one with: ollama pull tinyllama".to_string();
    }

    #[derive(Tabled)]
    struct ModelRow {
        #[tabled(rename = "")]
        marker: &'static str,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "SIZE")]
        size: String,
        #[tabled(rename = "MODIFIED")]
        modified: String,
    }

    let rows: Vec<ModelRow> = models
        .iter()
        .map(|m| ModelRow {
            marker: if selected == Some(m.name.as_str()) { "*" } else { "" },
            name: m.name.clone(),
            size: m.size.map(format_size).unwrap_or_else(|| "-".to_string()),
            modified: m
                .modified_at
                .as_deref()
                .map(|t| truncate(t, 19))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the servers found by a scan
pub fn format_scan(found: &[CandidateHost], port: u16) -> String {
    if found.is_empty() {
        return "No Ollama servers found".to_string();
    }

    #[derive(Tabled)]
    struct ScanRow {
        #[tabled(rename = "#")]
        rank: usize,
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "SOURCE")]
        origin: String,
    }

    let rows: Vec<ScanRow> = found
        .iter()
        .enumerate()
        .map(|(i, c)| ScanRow {
            rank: i + 1,
            address: ServerSession::new(c.address.clone(), port).base_url(),
            origin: c.origin.to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the preference record as a key/value table
pub fn format_config(config: &ConnectionConfig) -> String {
    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "KEY")]
        key: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let rows: Vec<ConfigRow> = ConfigKey::ALL
        .into_iter()
        .map(|key| {
            let value = config.get(key);
            ConfigRow {
                key: key.as_str(),
                value: if value.is_empty() { "-".to_string() } else { value },
            }
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Truncate a string to at most `max_len` characters
fn truncate(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
///
/// Outputs to stderr.
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
