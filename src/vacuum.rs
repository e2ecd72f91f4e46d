#![allow(clippy::self_named_module_files)]

use crate::clients::ClientStateAdapter;
use crate::config::{is_project_config_path, reader, writer, McpConfigDocument, ServerMap};
use crate::registry::StoreDescriptor;
use crate::server::{configs_equivalent, specs_to_server_map, ServerSpec};
use crate::sync::StoreError;
use anyhow::{Context, Result};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub mod resolver;

pub use resolver::{
    AutoResolve, AutoResolver, Candidate, Choice, ConflictResolver, InteractiveResolver,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Resolve collisions without asking; `None` defers to the interactive resolver.
    pub auto_resolve: Option<AutoResolve>,
    /// Leave names that already exist in the global scope untouched.
    pub skip_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConflict {
    pub server: String,
    pub chosen_source: String,
    pub rejected_source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Server name to the store it was taken from.
    pub imported: IndexMap<String, String>,
    pub conflicts: Vec<ImportConflict>,
    pub skipped: Vec<String>,
    pub errors: Vec<StoreError>,
}

impl ImportOutcome {
    fn record_error<S: Into<String>>(&mut self, store: &str, message: S) {
        self.errors.push(StoreError { store: store.to_string(), message: message.into() });
    }
}

/// Pulls servers out of every store into the global scope.
pub struct VacuumImporter<'a> {
    adapter: &'a ClientStateAdapter<'a>,
}

impl<'a> VacuumImporter<'a> {
    pub const fn new(adapter: &'a ClientStateAdapter<'a>) -> Self {
        Self { adapter }
    }

    /// Scan `stores` in order and merge what they hold into `global_path`.
    ///
    /// The first store to define a name holds it; a later, different
    /// definition is settled by `options.auto_resolve` when set, otherwise by
    /// `interactive`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The global scope document exists but is not valid (nothing is scanned)
    /// - The resolver fails or is cancelled (nothing is written)
    /// - The global scope document cannot be written
    pub fn import_all(
        &self,
        stores: &[StoreDescriptor],
        global_path: &Path,
        options: ImportOptions,
        interactive: &mut dyn ConflictResolver,
    ) -> Result<ImportOutcome> {
        let mut global =
            reader::load_document(global_path)?.unwrap_or_else(McpConfigDocument::empty);

        let mut auto;
        let resolver: &mut dyn ConflictResolver = match options.auto_resolve {
            Some(policy) => {
                auto = AutoResolver(policy);
                &mut auto
            },
            None => interactive,
        };

        let mut outcome = ImportOutcome::default();
        let mut discovered: IndexMap<String, Candidate> = IndexMap::new();

        for store in stores {
            let Some(servers) = self.read_store(store, &mut outcome) else {
                continue;
            };

            for (name, config) in servers {
                if let Err(e) = ServerSpec::from_config(&name, &config) {
                    warn!("Not importing {name} from {}: {e}", store.name);
                    outcome.record_error(&store.path, format!("Skipped {name}: {e}"));
                    continue;
                }
                let challenger = Candidate { source: store.name.clone(), config };

                let mut slot = match discovered.entry(name) {
                    Entry::Vacant(slot) => {
                        slot.insert(challenger);
                        continue;
                    },
                    Entry::Occupied(slot) => slot,
                };
                let name = slot.key().clone();
                let incumbent = slot.get_mut();
                if configs_equivalent(&name, &incumbent.config, &challenger.config) {
                    debug!("{name} from {} matches {}", challenger.source, incumbent.source);
                    continue;
                }

                let conflict = match resolver.resolve(&name, incumbent, &challenger)? {
                    Choice::KeepIncumbent => ImportConflict {
                        server: name,
                        chosen_source: incumbent.source.clone(),
                        rejected_source: challenger.source,
                    },
                    Choice::TakeChallenger => {
                        let rejected = std::mem::replace(incumbent, challenger);
                        ImportConflict {
                            server: name,
                            chosen_source: incumbent.source.clone(),
                            rejected_source: rejected.source,
                        }
                    },
                };
                outcome.conflicts.push(conflict);
            }
        }

        if discovered.is_empty() {
            info!("No servers found to import");
            return Ok(outcome);
        }

        let servers = global.servers_mut();
        for (name, candidate) in discovered {
            if options.skip_existing && servers.contains_key(&name) {
                outcome.skipped.push(name);
                continue;
            }
            servers.insert(name.clone(), candidate.config);
            outcome.imported.insert(name, candidate.source);
        }

        if !outcome.imported.is_empty() {
            writer::write_document(global_path, &global)
                .with_context(|| {
                    format!("Failed to write global config {}", global_path.display())
                })?;
            info!("Imported {} servers into {}", outcome.imported.len(), global_path.display());
        }

        Ok(outcome)
    }

    fn read_store(
        &self,
        store: &StoreDescriptor,
        outcome: &mut ImportOutcome,
    ) -> Option<ServerMap> {
        if is_project_config_path(&store.path) {
            debug!("Skipping project document {}", store.path);
            return None;
        }

        if store.is_cli() {
            let Some(client_id) = store.client_id() else {
                outcome.record_error(&store.path, "Not a cli:<client> location");
                return None;
            };
            return match self.adapter.list_servers(client_id) {
                Some(servers) => Some(specs_to_server_map(servers)),
                None => {
                    let message = format!("Failed to list servers from {client_id}");
                    outcome.record_error(&store.path, message);
                    None
                },
            };
        }

        let path = Path::new(&store.path);
        if !path.exists() {
            debug!("{} does not exist, skipping", store.path);
            return None;
        }
        match reader::read_document(path) {
            Some(document) => Some(document.servers()),
            None => {
                outcome.record_error(&store.path, "Failed to read config");
                None
            },
        }
    }
}
