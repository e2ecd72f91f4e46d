use crate::clients::ClientStateAdapter;
use crate::config::{reader, ServerMap};
use crate::registry::StoreDescriptor;
use crate::scopes::ScopeStore;
use crate::server::{specs_to_server_map, Scope};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// What a store currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
    Found(ServerMap),
    NotFound,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub store: StoreDescriptor,
    pub state: StoreState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub global: ServerMap,
    /// `None` when the working directory has no project document.
    pub project: Option<ServerMap>,
    pub stores: Vec<StoreStatus>,
}

/// Current server map of one store, read from disk or listed through its CLI.
pub fn read_store_state(store: &StoreDescriptor, adapter: &ClientStateAdapter<'_>) -> StoreState {
    if store.is_cli() {
        let Some(client_id) = store.client_id() else {
            return StoreState::Error("Not a cli:<client> location".to_string());
        };
        return adapter.list_servers(client_id).map_or_else(
            || StoreState::Error(format!("Failed to list servers from {client_id}")),
            |servers| StoreState::Found(specs_to_server_map(servers)),
        );
    }

    let path = Path::new(&store.path);
    if !path.exists() {
        return StoreState::NotFound;
    }
    reader::read_document(path).map_or_else(
        || StoreState::Error("Failed to read config".to_string()),
        |document| StoreState::Found(document.servers()),
    )
}

/// State of every store, in the order given.
pub fn scan_stores(
    stores: &[StoreDescriptor],
    adapter: &ClientStateAdapter<'_>,
) -> Vec<StoreStatus> {
    stores
        .iter()
        .map(|store| {
            let state = read_store_state(store, adapter);
            debug!("{}: {state:?}", store.path);
            StoreStatus { store: store.clone(), state }
        })
        .collect()
}

/// Both scopes plus the state of every registered store.
///
/// # Errors
///
/// Returns an error if a scope document exists but is not a valid document.
pub fn server_status(
    scopes: &ScopeStore,
    stores: &[StoreDescriptor],
    adapter: &ClientStateAdapter<'_>,
) -> Result<ServerStatus> {
    Ok(ServerStatus {
        global: scopes.read(Scope::Global)?.servers(),
        project: scopes.read_project()?.map(|document| document.servers()),
        stores: scan_stores(stores, adapter),
    })
}
