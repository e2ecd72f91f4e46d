use super::McpConfigDocument;
use crate::McpSyncError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read a store document, tolerating missing and corrupt files.
///
/// Returns `None` when the file does not exist, cannot be read, or does not
/// decode as an object with an optional `mcpServers` map. Never fails.
pub fn read_document<P: AsRef<Path>>(path: P) -> Option<McpConfigDocument> {
    read_json(path.as_ref())
}

/// Read a document that is about to be modified and written back.
///
/// A missing file is `Ok(None)`. Unlike [`read_document`], a file that exists
/// but cannot be read or decoded is an error, so callers never overwrite it.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not a valid document.
pub fn load_document<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<McpConfigDocument>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("{} does not exist", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(McpSyncError::from)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = serde_json::from_str(&content)
        .map_err(McpSyncError::from)
        .with_context(|| format!("Refusing to modify {}: not a valid config", path.display()))?;
    Ok(Some(document))
}

/// Read and decode any JSON file under the same missing/corrupt tolerance.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!("{} does not exist", path.display());
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            return None;
        },
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to parse {}: {e}", path.display());
            None
        },
    }
}
