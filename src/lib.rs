#![allow(missing_docs)]

pub mod app_config;
pub mod bootstrap;
pub mod cli;
pub mod clients;
pub mod config;
pub mod discovery;
pub mod master_list;
pub mod registry;
pub mod scopes;
pub mod server;
pub mod status;
pub mod sync;
pub mod template;
pub mod vacuum;
pub mod validation;

pub use config::{Config, McpConfigDocument, McpServerConfig};
pub use master_list::build_master_list;
pub use server::{MasterList, Scope, ServerSpec};
pub use sync::{sync_all, SyncOptions, SyncOutcome};
pub use vacuum::{ImportOptions, ImportOutcome, VacuumImporter};

#[derive(Debug, thiserror::Error)]
pub enum McpSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] clients::TemplateError),

    #[error("Cancelled")]
    Cancelled,
}
