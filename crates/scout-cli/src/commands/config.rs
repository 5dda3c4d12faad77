//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use scout_core::{ConfigKey, ConnectionConfig};

use crate::output::{format_config, print_info, print_success};

/// Show the preference file
pub fn config_show(path: &Path) -> Result<()> {
    if !path.exists() {
        print_info(&format!("No preference file at {:?}, showing defaults", path));
    }
    let config = ConnectionConfig::try_load(path)
        .with_context(|| format!("Failed to read preference file: {:?}", path))?;

    println!("{}", path.display());
    println!("{}", format_config(&config));
    Ok(())
}

/// Print the preference file location
pub fn config_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

/// Set a preference value
pub fn config_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    edit(path, |config| config.set(key, value))?;

    print_success(&format!("Set {} = {}", key, value.trim()));
    Ok(())
}

/// Reset a preference value to its default
pub fn config_unset(path: &Path, key: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    edit(path, |config| {
        config.unset(key);
        Ok(())
    })?;

    print_success(&format!("Reset {}", key));
    Ok(())
}

fn edit<F>(path: &Path, apply: F) -> Result<()>
where
    F: FnOnce(&mut ConnectionConfig) -> Result<(), scout_core::ConfigError>,
{
    let mut config = ConnectionConfig::try_load(path)
        .with_context(|| format!("Failed to read preference file: {:?}", path))?;
    apply(&mut config)?;
    config
        .try_save(path)
        .with_context(|| format!("Failed to write preference file: {:?}", path))?;
    Ok(())
}
