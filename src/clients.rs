#![allow(clippy::self_named_module_files)]

pub mod adapter;
pub mod definitions;
pub mod executor;
pub mod template;

pub use adapter::ClientStateAdapter;
pub use definitions::{ClientDefinition, ClientDefinitions, ClientKind, CommandArgsStyle};
pub use executor::{CommandRunner, ProcessOutput, SystemRunner, Timeouts};
pub use template::{CliScope, CommandTemplate, TemplateError};
