//! Scan command implementation

use anyhow::Result;

use super::Settings;
use crate::output::{format_scan, print_info, print_success};

/// Execute the scan command
///
/// Probes every candidate and lists the servers that answered. The
/// preference file is left untouched.
pub async fn scan_command(settings: &Settings) -> Result<()> {
    let prefs = settings.preferences();
    let engine = settings.discovery_engine();
    let port = prefs.port();

    let candidates = engine.candidates(prefs.config());
    print_info(&format!(
        "Scanning {} address(es) on port {}...",
        candidates.len(),
        port
    ));

    let found = engine.scan(prefs.config(), port).await;
    if !found.is_empty() {
        print_success(&format!("Found {} server(s)", found.len()));
    }
    println!("{}", format_scan(&found, port));
    Ok(())
}
