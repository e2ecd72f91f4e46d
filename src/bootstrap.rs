use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Empty global scope document
const DEFAULT_GLOBAL_CONFIG: &str = "{\n  \"mcpServers\": {}\n}\n";

/// Empty location registry
const DEFAULT_LOCATIONS: &str = "{\n  \"locations\": []\n}\n";

/// Empty user client definitions; entries here override the built-ins by id
const DEFAULT_CLIENT_DEFINITIONS: &str = "{\n  \"clients\": {}\n}\n";

/// Example config.toml template
const EXAMPLE_CONFIG: &str = r#"# mcp-sync Configuration File
# Every key is optional; the values shown are the defaults.

# [timeouts]
# Seconds allowed for each kind of client CLI call
# probe-secs = 5        # `<client> --version` availability checks
# mutation-secs = 10    # mcp list / add / remove / get
# editor-secs = 300     # edit-client-definitions

# [vacuum]
# Defaults for `mcp-sync vacuum` when the flags are not given
# auto-resolve = "first"  # Options: "first", "last"; unset means ask
# skip-existing = false
"#;

/// Create a file with content if it doesn't exist. Returns true if it was created.
fn create_file_if_needed(path: &Path, content: &str, description: &str) -> Result<bool> {
    if path.exists() {
        debug!("{description} already exists, skipping");
        return Ok(false);
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to create {}: {}", description, path.display()))?;
    info!("Created {description}");
    Ok(true)
}

/// Make sure the configuration directory and its files exist.
///
/// Existing files are never touched. Returns true on a first run, i.e. when
/// the location registry did not exist yet and the caller should seed it.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to create the configuration directory
/// - Unable to create any of the seed files
pub fn bootstrap_config(config: &Config) -> Result<bool> {
    fs::create_dir_all(&config.config_dir).with_context(|| {
        format!("Failed to create config directory: {}", config.config_dir.display())
    })?;

    create_file_if_needed(&config.global_config_path, DEFAULT_GLOBAL_CONFIG, "global.json")?;
    let first_run =
        create_file_if_needed(&config.locations_path, DEFAULT_LOCATIONS, "locations.json")?;
    create_file_if_needed(
        &config.client_definitions_path,
        DEFAULT_CLIENT_DEFINITIONS,
        "client_definitions.json",
    )?;
    create_file_if_needed(&config.app_config_path, EXAMPLE_CONFIG, "config.toml")?;

    Ok(first_run)
}
