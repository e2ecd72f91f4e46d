use crate::config::reader;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// How a client's configuration is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    #[default]
    File,
    Cli,
}

/// How `{command_args}` expands for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandArgsStyle {
    /// `--` followed by the launch argv, one element per word.
    #[default]
    Separator,
    /// A single element holding the shell-quoted, space-joined argv.
    Joined,
}

/// Command templates for a CLI-managed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CliCommands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_mcp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_mcp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_mcp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_mcp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config_type: ClientKind,
    /// Platform name (`darwin`, `linux`, `windows`) to path template.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fallback_paths: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_commands: Option<CliCommands>,
    #[serde(default)]
    pub command_args_style: CommandArgsStyle,
}

impl ClientDefinition {
    /// Path template for `platform`, preferring `paths` over `fallback_paths`.
    pub fn path_template(&self, platform: &str) -> Option<&str> {
        self.paths
            .get(platform)
            .or_else(|| self.fallback_paths.get(platform))
            .map(String::as_str)
    }

    pub const fn is_cli(&self) -> bool {
        matches!(self.config_type, ClientKind::Cli)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientDefinitions {
    #[serde(default)]
    pub clients: IndexMap<String, ClientDefinition>,
}

impl ClientDefinitions {
    pub fn get(&self, client_id: &str) -> Option<&ClientDefinition> {
        self.clients.get(client_id)
    }

    /// Overlay `user` entries onto these, replacing by client id.
    pub fn merge(&mut self, user: Self) {
        for (id, definition) in user.clients {
            self.clients.insert(id, definition);
        }
    }
}

pub const BUILTIN_CLIENT_DEFINITIONS: &str = r#"{
  "clients": {
    "claude-desktop": {
      "name": "Claude Desktop",
      "description": "Claude Desktop application",
      "config_type": "file",
      "paths": {
        "darwin": "~/Library/Application Support/Claude/claude_desktop_config.json",
        "windows": "%APPDATA%/Claude/claude_desktop_config.json",
        "linux": "~/.config/Claude/claude_desktop_config.json"
      }
    },
    "claude-code": {
      "name": "Claude Code",
      "description": "Claude Code CLI",
      "config_type": "cli",
      "cli_commands": {
        "list_mcp": "claude mcp list",
        "add_mcp": "claude mcp add {name} --scope {scope} {env_flags} {command_args}",
        "remove_mcp": "claude mcp remove {name} --scope {scope}",
        "get_mcp": "claude mcp get {name}"
      },
      "command_args_style": "separator"
    },
    "cline": {
      "name": "Cline",
      "description": "Cline VS Code extension",
      "config_type": "file",
      "paths": {
        "darwin": "~/Library/Application Support/Code/User/globalStorage/saoudrizwan.claude-dev/settings/cline_mcp_settings.json",
        "windows": "%APPDATA%/Code/User/globalStorage/saoudrizwan.claude-dev/settings/cline_mcp_settings.json",
        "linux": "~/.config/Code/User/globalStorage/saoudrizwan.claude-dev/settings/cline_mcp_settings.json"
      }
    },
    "roo": {
      "name": "Roo Code",
      "description": "Roo Code VS Code extension",
      "config_type": "file",
      "paths": {
        "darwin": "~/Library/Application Support/Code/User/globalStorage/rooveterinaryinc.roo-cline/settings/mcp_settings.json",
        "windows": "%APPDATA%/Code/User/globalStorage/rooveterinaryinc.roo-cline/settings/mcp_settings.json",
        "linux": "~/.config/Code/User/globalStorage/rooveterinaryinc.roo-cline/settings/mcp_settings.json"
      }
    },
    "cursor": {
      "name": "Cursor",
      "description": "Cursor editor",
      "config_type": "file",
      "paths": {
        "darwin": "~/.cursor/mcp.json",
        "windows": "%USERPROFILE%/.cursor/mcp.json",
        "linux": "~/.cursor/mcp.json"
      }
    }
  }
}
"#;

/// The compiled-in client definitions.
///
/// # Errors
///
/// Returns an error if the embedded JSON does not decode, which only a bad
/// edit to [`BUILTIN_CLIENT_DEFINITIONS`] can cause.
pub fn builtin_client_definitions() -> serde_json::Result<ClientDefinitions> {
    serde_json::from_str(BUILTIN_CLIENT_DEFINITIONS)
}

/// Built-in definitions overlaid with the user's file, keyed by client id.
///
/// A missing user file is normal. A malformed one is logged and ignored.
///
/// # Errors
///
/// Returns an error if the built-in definitions fail to decode.
pub fn resolve_client_definitions(user_path: &Path) -> serde_json::Result<ClientDefinitions> {
    let mut definitions = builtin_client_definitions()?;

    if user_path.exists() {
        match reader::read_json::<ClientDefinitions>(user_path) {
            Some(user) => {
                debug!("Loaded {} user client definitions", user.clients.len());
                definitions.merge(user);
            },
            None => warn!(
                "Ignoring malformed client definitions at {}, using built-ins",
                user_path.display()
            ),
        }
    }

    Ok(definitions)
}
