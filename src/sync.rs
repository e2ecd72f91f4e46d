#![allow(clippy::self_named_module_files)]

use crate::clients::ClientStateAdapter;
use crate::config::{is_project_config_path, McpConfigDocument};
use crate::master_list::build_master_list;
use crate::registry::StoreDescriptor;
use crate::server::{MasterList, Scope};
use tracing::{debug, info, warn};

pub mod cli_store;
pub mod file_store;

pub use cli_store::CliStoreReconciler;
pub use file_store::FileStoreReconciler;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub global_only: bool,
    pub project_only: bool,
    /// Restrict the run to the store with this identity.
    pub location: Option<String>,
}

/// A store entry that differed from the master list and was overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConflict {
    pub server: String,
    pub store: String,
    pub source: Scope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub store: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Identities of stores that changed (or would change, under dry run).
    pub updated_stores: Vec<String>,
    pub conflicts: Vec<SyncConflict>,
    pub errors: Vec<StoreError>,
    pub dry_run: bool,
}

impl SyncOutcome {
    pub const fn new(dry_run: bool) -> Self {
        Self { updated_stores: Vec::new(), conflicts: Vec::new(), errors: Vec::new(), dry_run }
    }

    pub fn record_error<S: Into<String>>(&mut self, store: &str, message: S) {
        self.errors.push(StoreError { store: store.to_string(), message: message.into() });
    }

    /// True if nothing changed and nothing needed reporting.
    pub fn is_noop(&self) -> bool {
        self.updated_stores.is_empty() && self.conflicts.is_empty() && self.errors.is_empty()
    }
}

/// Pushes the master list into one kind of store.
pub trait StoreReconciler {
    /// Reconcile `store` against `master`, recording results in `outcome`.
    ///
    /// Soft failures are recorded in `outcome.errors` directly.
    ///
    /// # Errors
    ///
    /// Returns an error for hard failures such as a failed write; the caller
    /// records it against the store and carries on with the next one.
    fn reconcile(
        &self,
        store: &StoreDescriptor,
        master: &MasterList,
        outcome: &mut SyncOutcome,
    ) -> anyhow::Result<()>;
}

/// Stores a run should touch, in registration order.
///
/// A named location selects exactly that store (or none). Otherwise project
/// documents are never targets, and scope-tagged stores are dropped by the
/// opposite `--*-only` flag.
pub fn select_stores(stores: Vec<StoreDescriptor>, options: &SyncOptions) -> Vec<StoreDescriptor> {
    if let Some(location) = &options.location {
        return stores.into_iter().filter(|store| &store.path == location).take(1).collect();
    }

    stores
        .into_iter()
        .filter(|store| !is_project_config_path(&store.path))
        .filter(|store| !(options.global_only && store.scope == Some(Scope::Project)))
        .filter(|store| !(options.project_only && store.scope == Some(Scope::Global)))
        .collect()
}

/// Dispatches each store to the file or CLI reconciler.
pub struct Reconciler<'a> {
    file: FileStoreReconciler,
    cli: CliStoreReconciler<'a>,
}

impl<'a> Reconciler<'a> {
    pub const fn new(adapter: &'a ClientStateAdapter<'a>) -> Self {
        Self { file: FileStoreReconciler, cli: CliStoreReconciler::new(adapter) }
    }

    /// Reconcile every store in order. One store's failure never stops the rest.
    pub fn reconcile_all(
        &self,
        stores: &[StoreDescriptor],
        master: &MasterList,
        dry_run: bool,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::new(dry_run);

        for store in stores {
            debug!("Reconciling {}", store.path);
            let strategy: &dyn StoreReconciler =
                if store.is_cli() { &self.cli } else { &self.file };
            if let Err(e) = strategy.reconcile(store, master, &mut outcome) {
                warn!("Failed to sync {}: {e:#}", store.path);
                outcome.record_error(&store.path, format!("{e:#}"));
            }
        }

        info!(
            "Sync finished: {} updated, {} conflicts, {} errors",
            outcome.updated_stores.len(),
            outcome.conflicts.len(),
            outcome.errors.len()
        );
        outcome
    }
}

/// Build the master list from the scopes and push it into the selected stores.
pub fn sync_all(
    global: &McpConfigDocument,
    project: Option<&McpConfigDocument>,
    stores: Vec<StoreDescriptor>,
    adapter: &ClientStateAdapter<'_>,
    options: &SyncOptions,
) -> SyncOutcome {
    let master = build_master_list(global, project, !options.project_only, !options.global_only);
    let targets = select_stores(stores, options);
    Reconciler::new(adapter).reconcile_all(&targets, &master, options.dry_run)
}
