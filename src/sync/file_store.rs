use super::{StoreReconciler, SyncConflict, SyncOutcome};
use crate::config::{reader, writer, ServerMap};
use crate::registry::StoreDescriptor;
use crate::server::{configs_equivalent, MasterList};
use anyhow::Context;
use std::path::Path;
use tracing::{debug, info};

/// Reconciles JSON documents with an `mcpServers` map.
///
/// Servers the master list does not know about are left alone. Every master
/// entry is written over whatever the store had; differing local values are
/// reported as conflicts. Other top-level keys are preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStoreReconciler;

impl StoreReconciler for FileStoreReconciler {
    fn reconcile(
        &self,
        store: &StoreDescriptor,
        master: &MasterList,
        outcome: &mut SyncOutcome,
    ) -> anyhow::Result<()> {
        let path = Path::new(&store.path);
        let Some(mut document) = reader::read_document(path) else {
            outcome.record_error(&store.path, "Failed to read config");
            return Ok(());
        };

        let current = document.servers();
        let mut conflicts = Vec::new();
        let mut merged = ServerMap::new();

        for (name, config) in &current {
            match master.get(name) {
                None => {
                    merged.insert(name.clone(), config.clone());
                },
                Some(entry) if !configs_equivalent(name, config, &entry.config) => {
                    conflicts.push(SyncConflict {
                        server: name.clone(),
                        store: store.path.clone(),
                        source: entry.scope,
                    });
                },
                Some(_) => {},
            }
        }
        for (name, entry) in master {
            merged.insert(name.clone(), entry.config.clone());
        }

        if current == merged {
            debug!("{} is up to date", store.path);
        } else {
            if !outcome.dry_run {
                *document.servers_mut() = merged;
                writer::write_document(path, &document)
                    .with_context(|| format!("Failed to write {}", store.path))?;
                info!("Updated {}", store.path);
            }
            outcome.updated_stores.push(store.path.clone());
        }

        outcome.conflicts.extend(conflicts);
        Ok(())
    }
}
