use super::McpConfigDocument;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write a store document as indented JSON.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to create parent directories
/// - Unable to serialize the document
/// - Unable to write or replace the file
pub fn write_document<P: AsRef<Path>>(path: P, document: &McpConfigDocument) -> anyhow::Result<()> {
    write_json(path.as_ref(), document)
}

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The content is staged in a temporary file beside the real target and
/// renamed into place, so an interrupted run leaves either the old or the new
/// document. A symlinked `path` keeps its link; the file it points at is
/// replaced and keeps its permissions.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to resolve an existing path
/// - Unable to create parent directories
/// - Unable to serialize the value
/// - Unable to write or rename the staged file
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let target = if path.exists() {
        fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))?
    } else {
        path.to_path_buf()
    };
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to stage write in {}", parent.display()))?;
    staged.write_all(json.as_bytes())?;
    if let Ok(metadata) = fs::metadata(&target) {
        fs::set_permissions(staged.path(), metadata.permissions())
            .with_context(|| format!("Failed to copy permissions of {}", target.display()))?;
    }
    staged
        .persist(&target)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", target.display(), e.error))?;

    Ok(())
}
