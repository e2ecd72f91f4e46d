use crate::config::{CommandField, McpServerConfig, ServerMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Which canonical source a server definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Project,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Project => write!(f, "project"),
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            _ => Err(format!("Unknown scope: {s}")),
        }
    }
}

/// Reasons a persisted entry cannot be expressed as a launchable [`ServerSpec`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("server '{0}' has no command")]
    MissingCommand(String),

    #[error("server '{0}' has an empty executable")]
    EmptyExecutable(String),

    #[error("server '{name}' is transport-only ({url})")]
    TransportOnly { name: String, url: String },
}

/// A launchable server: the executable head plus everything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub name: String,
    /// Non-empty; the first element is the executable.
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: IndexMap<String, String>,
}

impl ServerSpec {
    /// Normalize a persisted entry into its canonical form.
    ///
    /// A string `command` becomes a one-element vector; a list is taken as is.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry only carries a transport URL
    /// - The entry has no command at all
    /// - The command is empty or its executable is an empty string
    pub fn from_config(name: &str, config: &McpServerConfig) -> Result<Self, SpecError> {
        let command = match &config.command {
            Some(field) => field.to_argv(),
            None => {
                return Err(config.url.as_ref().map_or_else(
                    || SpecError::MissingCommand(name.to_string()),
                    |url| SpecError::TransportOnly { name: name.to_string(), url: url.clone() },
                ));
            },
        };

        if command.first().is_none_or(String::is_empty) {
            return Err(SpecError::EmptyExecutable(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            command,
            args: config.arg_strings(),
            env: config.env_strings(),
        })
    }

    /// The executable.
    pub fn executable(&self) -> &str {
        self.command.first().map_or("", String::as_str)
    }

    /// Full argument vector: `command` followed by `args`.
    ///
    /// This is the comparison key between stores that spell the same launch
    /// line differently (`"npx"` + `["-y","x"]` vs `["npx","-y","x"]`).
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        self.command.iter().chain(self.args.iter()).cloned().collect()
    }

    /// Persisted shape: executable as the `command` string, the rest as `args`.
    #[must_use]
    pub fn to_config(&self) -> McpServerConfig {
        let mut argv = self.argv().into_iter();
        McpServerConfig {
            command: argv.next().map(CommandField::Line),
            args: argv.map(Value::String).collect(),
            ..McpServerConfig::default()
        }
        .with_env(self.env.clone())
    }

    /// True if both specs launch the same argv with the same environment.
    #[must_use]
    pub fn same_launch(&self, other: &Self) -> bool {
        self.argv() == other.argv() && self.env == other.env
    }
}

/// A master-list entry with the scope it was taken from.
///
/// Provenance never reaches disk: stores receive only `config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenancedServerSpec {
    pub config: McpServerConfig,
    pub scope: Scope,
}

impl ProvenancedServerSpec {
    /// Canonical spec for this entry, if it launches a process.
    ///
    /// # Errors
    ///
    /// Returns the [`SpecError`] from [`ServerSpec::from_config`].
    pub fn spec(&self, name: &str) -> Result<ServerSpec, SpecError> {
        ServerSpec::from_config(name, &self.config)
    }
}

/// Merged, provenance-tagged authoritative server set, in insertion order.
pub type MasterList = IndexMap<String, ProvenancedServerSpec>;

/// Strip provenance, leaving the map as it would be persisted.
#[must_use]
pub fn to_server_map(master: &MasterList) -> ServerMap {
    master.iter().map(|(name, entry)| (name.clone(), entry.config.clone())).collect()
}

/// Persisted shapes of servers listed by a CLI client.
#[must_use]
pub fn specs_to_server_map(specs: IndexMap<String, ServerSpec>) -> ServerMap {
    specs.into_iter().map(|(name, spec)| (name, spec.to_config())).collect()
}

/// Semantic equality of two persisted entries.
///
/// Command-bearing entries compare by canonical argv and env; anything else
/// falls back to structural equality.
#[must_use]
pub fn configs_equivalent(name: &str, left: &McpServerConfig, right: &McpServerConfig) -> bool {
    match (ServerSpec::from_config(name, left), ServerSpec::from_config(name, right)) {
        (Ok(l), Ok(r)) => l.same_launch(&r) && left.extra == right.extra,
        _ => left == right,
    }
}
