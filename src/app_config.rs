use crate::clients::Timeouts;
use crate::vacuum::{AutoResolve, ImportOptions};
use crate::McpSyncError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub vacuum: VacuumDefaults,
}

/// Defaults for `vacuum` when the matching flags are not given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct VacuumDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resolve: Option<AutoResolve>,
    pub skip_existing: bool,
}

impl VacuumDefaults {
    /// Command-line values win; a `false` flag falls back to the configured default.
    #[must_use]
    pub fn import_options(
        self,
        auto_resolve: Option<AutoResolve>,
        skip_existing: bool,
    ) -> ImportOptions {
        ImportOptions {
            auto_resolve: auto_resolve.or(self.auto_resolve),
            skip_existing: skip_existing || self.skip_existing,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(McpSyncError::from)
            .with_context(|| format!("Failed to parse TOML config at {}", config_path.display()))?;

        Ok(Some(config))
    }
}
