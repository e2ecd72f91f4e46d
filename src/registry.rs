use crate::config::writer;
use crate::server::Scope;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of synthetic identities for CLI-managed stores.
pub const CLI_PREFIX: &str = "cli:";

/// How a store was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Auto,
    #[default]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Cli,
}

/// One registered configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    /// File path, or `cli:<client-id>`. Unique within the registry.
    pub path: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub config_type: StoreKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Restricts the store to one side of `--global-only` / `--project-only`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl StoreDescriptor {
    /// A manually registered file store; the name defaults to the file stem.
    pub fn manual(path: &str, name: Option<&str>) -> Self {
        let name = name.map_or_else(
            || {
                Path::new(path)
                    .file_stem()
                    .map_or_else(|| path.to_string(), |stem| stem.to_string_lossy().into_owned())
            },
            str::to_string,
        );
        let config_type =
            if path.starts_with(CLI_PREFIX) { StoreKind::Cli } else { StoreKind::File };
        Self {
            path: path.to_string(),
            name,
            location_type: LocationType::Manual,
            config_type,
            client_name: None,
            description: None,
            scope: None,
        }
    }

    /// Client id of a CLI store (`cli:claude-code` → `claude-code`).
    pub fn client_id(&self) -> Option<&str> {
        self.path.strip_prefix(CLI_PREFIX)
    }

    /// True for `cli:<client-id>` identities; `config_type` is informational only.
    pub fn is_cli(&self) -> bool {
        self.client_id().is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocationsFile {
    #[serde(default)]
    locations: Vec<StoreDescriptor>,
}

/// Persistent list of stores, in registration order.
pub trait LocationRegistry {
    /// # Errors
    ///
    /// Returns an error if the registry exists but cannot be read or decoded.
    fn list_stores(&self) -> Result<Vec<StoreDescriptor>>;

    /// Append `store`. Returns false if its identity is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or written.
    fn add_store(&self, store: StoreDescriptor) -> Result<bool>;

    /// Drop the store with identity `path`. Returns false if none matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or written.
    fn remove_store(&self, path: &str) -> Result<bool>;
}

/// [`LocationRegistry`] over `locations.json`.
#[derive(Debug, Clone)]
pub struct FileLocationRegistry {
    path: PathBuf,
}

impl FileLocationRegistry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, locations: Vec<StoreDescriptor>) -> Result<()> {
        writer::write_json(&self.path, &LocationsFile { locations })
            .with_context(|| format!("Failed to save locations to {}", self.path.display()))
    }
}

impl LocationRegistry for FileLocationRegistry {
    fn list_stores(&self) -> Result<Vec<StoreDescriptor>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let file: LocationsFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(file.locations)
    }

    fn add_store(&self, store: StoreDescriptor) -> Result<bool> {
        let mut locations = self.list_stores()?;
        if locations.iter().any(|existing| existing.path == store.path) {
            return Ok(false);
        }
        locations.push(store);
        self.save(locations)?;
        Ok(true)
    }

    fn remove_store(&self, path: &str) -> Result<bool> {
        let mut locations = self.list_stores()?;
        let before = locations.len();
        locations.retain(|existing| existing.path != path);
        if locations.len() == before {
            return Ok(false);
        }
        self.save(locations)?;
        Ok(true)
    }
}
