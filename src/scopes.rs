use crate::config::{reader, writer, Config, McpConfigDocument, McpServerConfig};
use crate::server::Scope;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// The two canonical server documents: global (per user) and project (per directory).
#[derive(Debug, Clone)]
pub struct ScopeStore {
    global_path: PathBuf,
    project_path: PathBuf,
}

impl ScopeStore {
    pub fn new<G: Into<PathBuf>, P: Into<PathBuf>>(global_path: G, project_path: P) -> Self {
        Self { global_path: global_path.into(), project_path: project_path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.global_config_path, &config.project_config_path)
    }

    pub fn path(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Global => &self.global_path,
            Scope::Project => &self.project_path,
        }
    }

    /// Document for `scope`; a missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a valid document.
    pub fn read(&self, scope: Scope) -> Result<McpConfigDocument> {
        Ok(reader::load_document(self.path(scope))?.unwrap_or_else(McpConfigDocument::empty))
    }

    /// The project document, only if one exists in the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a valid document.
    pub fn read_project(&self) -> Result<Option<McpConfigDocument>> {
        reader::load_document(&self.project_path)
    }

    /// Insert or replace `name` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope document is corrupt or cannot be written.
    pub fn add_server(&self, scope: Scope, name: &str, config: McpServerConfig) -> Result<()> {
        let mut document = self.read(scope)?;
        document.servers_mut().insert(name.to_string(), config);
        self.write(scope, &document)?;
        info!("Added {name} to {scope} config");
        Ok(())
    }

    /// Remove `name` from `scope`. Returns false if it was not there.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope document is corrupt or cannot be written.
    pub fn remove_server(&self, scope: Scope, name: &str) -> Result<bool> {
        let mut document = self.read(scope)?;
        if document.servers_mut().shift_remove(name).is_none() {
            return Ok(false);
        }
        self.write(scope, &document)?;
        info!("Removed {name} from {scope} config");
        Ok(true)
    }

    /// Create an empty project document. Returns false if one already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn init_project(&self) -> Result<bool> {
        if self.project_path.exists() {
            return Ok(false);
        }
        self.write(Scope::Project, &McpConfigDocument::empty())?;
        Ok(true)
    }

    fn write(&self, scope: Scope, document: &McpConfigDocument) -> Result<()> {
        let path = self.path(scope);
        writer::write_document(path, document)
            .with_context(|| format!("Failed to save {scope} config at {}", path.display()))
    }
}
