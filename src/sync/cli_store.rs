use super::{StoreReconciler, SyncConflict, SyncOutcome};
use crate::clients::{CliScope, ClientStateAdapter};
use crate::registry::StoreDescriptor;
use crate::server::{MasterList, Scope, ServerSpec, SpecError};
use anyhow::anyhow;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// CLI scope a master entry is registered under.
pub const fn cli_scope_for(scope: Scope) -> CliScope {
    match scope {
        Scope::Global => CliScope::User,
        Scope::Project => CliScope::Local,
    }
}

/// Reconciles a CLI-managed client through its list/add/remove commands.
///
/// The client is mirrored: command-bearing master servers are added or
/// replaced, and anything else it lists is removed. Entries are compared by
/// canonical argv since that is all the list output carries.
pub struct CliStoreReconciler<'a> {
    adapter: &'a ClientStateAdapter<'a>,
}

impl<'a> CliStoreReconciler<'a> {
    pub const fn new(adapter: &'a ClientStateAdapter<'a>) -> Self {
        Self { adapter }
    }
}

impl StoreReconciler for CliStoreReconciler<'_> {
    fn reconcile(
        &self,
        store: &StoreDescriptor,
        master: &MasterList,
        outcome: &mut SyncOutcome,
    ) -> anyhow::Result<()> {
        let client_id = store
            .client_id()
            .ok_or_else(|| anyhow!("{} is not a cli:<client> location", store.path))?;

        let Some(current) = self.adapter.list_servers(client_id) else {
            outcome.record_error(&store.path, format!("Failed to list servers from {client_id}"));
            return Ok(());
        };

        // URL-only servers cannot be registered through the CLI yet
        let mut launchable: IndexMap<&str, (ServerSpec, Scope)> = IndexMap::new();
        for (name, entry) in master {
            match entry.spec(name) {
                Ok(spec) => {
                    launchable.insert(name.as_str(), (spec, entry.scope));
                },
                Err(e @ SpecError::TransportOnly { .. }) => {
                    debug!("Not syncing to {client_id}: {e}");
                },
                Err(e) => warn!("Not syncing to {client_id}: {e}"),
            }
        }

        for (name, local) in &current {
            let Some(entry) = master.get(name) else {
                continue;
            };
            let differs = launchable
                .get(name.as_str())
                .is_none_or(|(spec, _)| spec.argv() != local.argv());
            if differs {
                outcome.conflicts.push(SyncConflict {
                    server: name.clone(),
                    store: store.path.clone(),
                    source: entry.scope,
                });
            }
        }

        let stale: Vec<&String> =
            current.keys().filter(|name| !launchable.contains_key(name.as_str())).collect();
        let pending: Vec<(&str, &ServerSpec, Scope)> = launchable
            .iter()
            .filter(|(name, (spec, _))| {
                current.get(**name).is_none_or(|local| local.argv() != spec.argv())
            })
            .map(|(name, (spec, scope))| (*name, spec, *scope))
            .collect();

        if stale.is_empty() && pending.is_empty() {
            debug!("{} is up to date", store.path);
            return Ok(());
        }
        outcome.updated_stores.push(store.path.clone());
        if outcome.dry_run {
            return Ok(());
        }

        for name in stale {
            if !self.adapter.remove_server(client_id, name, None) {
                outcome.record_error(&store.path, format!("Failed to remove server {name}"));
            }
        }
        for (name, spec, scope) in pending {
            if current.contains_key(name) && !self.adapter.remove_server(client_id, name, None) {
                outcome.record_error(
                    &store.path,
                    format!("Failed to remove server {name} before update"),
                );
                continue;
            }
            let scope = cli_scope_for(scope);
            if self.adapter.add_server(client_id, name, &spec.argv(), &spec.env, scope) {
                info!("Synced {name} to {client_id}");
            } else {
                outcome.record_error(&store.path, format!("Failed to add server {name}"));
            }
        }

        Ok(())
    }
}
