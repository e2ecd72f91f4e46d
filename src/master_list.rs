use crate::config::McpConfigDocument;
use crate::server::{MasterList, ProvenancedServerSpec, Scope};

/// Merge the global and project scopes into the authoritative server list.
///
/// Global entries come first in their document order. A project entry with
/// the same name replaces the global record outright (no field merge) and
/// is tagged [`Scope::Project`]; project-only names are appended.
pub fn build_master_list(
    global: &McpConfigDocument,
    project: Option<&McpConfigDocument>,
    include_global: bool,
    include_project: bool,
) -> MasterList {
    let mut master = MasterList::new();

    if include_global {
        for (name, config) in global.servers() {
            master.insert(name, ProvenancedServerSpec { config, scope: Scope::Global });
        }
    }

    if include_project {
        if let Some(project) = project {
            for (name, config) in project.servers() {
                master.insert(name, ProvenancedServerSpec { config, scope: Scope::Project });
            }
        }
    }

    master
}
