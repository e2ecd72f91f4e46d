#![allow(clippy::self_named_module_files)]

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub mod reader;
pub mod writer;

/// Name of the project-scope document in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".mcp.json";

/// Ordered server map as it appears under `mcpServers`.
pub type ServerMap = IndexMap<String, McpServerConfig>;

/// The `command` field is written by different tools either as a single
/// executable string or as a full argument vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CommandField {
    Line(String),
    Argv(Vec<String>),
}

impl CommandField {
    /// Borrow the command as an argument vector prefix.
    #[must_use]
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            Self::Line(command) => vec![command.clone()],
            Self::Argv(argv) => argv.clone(),
        }
    }
}

impl From<&str> for CommandField {
    fn from(value: &str) -> Self {
        Self::Line(value.to_string())
    }
}

/// One entry under `mcpServers`.
///
/// Decoding never rejects an object: a known key whose value has an
/// unexpected shape is kept in `extra` and written back as found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "Map<String, Value>")]
pub struct McpServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandField>,
    // Raw values: some tools write numbers (`"PORT": 3000`) where others write strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    // Client-specific keys (disabled, autoApprove, ...) survive a rewrite untouched
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl McpServerConfig {
    /// Build a stdio server entry from a command and its arguments.
    #[must_use]
    pub fn stdio<S: Into<String>>(command: S, args: Vec<String>) -> Self {
        Self {
            command: Some(CommandField::Line(command.into())),
            args: args.into_iter().map(Value::String).collect(),
            ..Self::default()
        }
    }

    /// Replace the environment with string values.
    #[must_use]
    pub fn with_env(mut self, env: IndexMap<String, String>) -> Self {
        self.env = env.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
        self
    }

    /// `args` as launch words.
    #[must_use]
    pub fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(value_text).collect()
    }

    /// `env` with every value as text.
    #[must_use]
    pub fn env_strings(&self) -> IndexMap<String, String> {
        self.env.iter().map(|(key, value)| (key.clone(), value_text(value))).collect()
    }
}

impl From<Map<String, Value>> for McpServerConfig {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            command: take_field(&mut raw, "command"),
            args: take_field(&mut raw, "args").unwrap_or_default(),
            env: take_field(&mut raw, "env").unwrap_or_default(),
            server_type: take_field(&mut raw, "type"),
            url: take_field(&mut raw, "url"),
            extra: raw,
        }
    }
}

/// Remove `key` from `raw` if its value decodes as `T`; any other shape stays put.
fn take_field<T: DeserializeOwned>(raw: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = serde_json::from_value(raw.get(key)?.clone()).ok()?;
    raw.remove(key);
    Some(value)
}

/// Text form of a JSON value as it would appear on a command line.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A structured store document: the server map plus every other top-level key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct McpConfigDocument {
    #[serde(rename = "mcpServers", skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<ServerMap>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl McpConfigDocument {
    /// An empty document with an (empty) server map, as written for new scopes.
    #[must_use]
    pub fn empty() -> Self {
        Self { mcp_servers: Some(ServerMap::new()), other: Map::new() }
    }

    /// Servers in this document, or an empty map when the key is absent.
    #[must_use]
    pub fn servers(&self) -> ServerMap {
        self.mcp_servers.clone().unwrap_or_default()
    }

    /// Mutable access to the server map, creating it if needed.
    pub fn servers_mut(&mut self) -> &mut ServerMap {
        self.mcp_servers.get_or_insert_with(ServerMap::new)
    }
}

/// Locations of the files mcp-sync owns.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub global_config_path: PathBuf,
    pub locations_path: PathBuf,
    pub client_definitions_path: PathBuf,
    pub app_config_path: PathBuf,
    pub project_config_path: PathBuf,
}

impl Config {
    /// Resolve paths from the environment and the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration directory cannot be determined
    /// - The current directory cannot be determined
    pub fn new() -> anyhow::Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let project_dir = std::env::current_dir()?;
        Ok(Self::with_dirs(config_dir, &project_dir))
    }

    /// Build paths rooted at explicit directories.
    pub fn with_dirs<P: Into<PathBuf>>(config_dir: P, project_dir: &Path) -> Self {
        let config_dir = config_dir.into();
        Self {
            global_config_path: config_dir.join("global.json"),
            locations_path: config_dir.join("locations.json"),
            client_definitions_path: config_dir.join("client_definitions.json"),
            app_config_path: config_dir.join("config.toml"),
            project_config_path: project_dir.join(PROJECT_CONFIG_FILE),
            config_dir,
        }
    }

    /// Gets the configuration directory path.
    ///
    /// # Errors
    ///
    /// Returns an error if no home or config directory can be determined.
    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("mcp-sync"));
        }
        directories::ProjectDirs::from("", "", "mcp-sync")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }
}

/// True if `path` names a project-scope document (those are sources, never sync targets).
#[must_use]
pub fn is_project_config_path(path: &str) -> bool {
    Path::new(path).file_name().is_some_and(|name| name == PROJECT_CONFIG_FILE)
}
