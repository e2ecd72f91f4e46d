use mcp_sync::server::to_server_map;
use mcp_sync::{build_master_list, McpConfigDocument, Scope};
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(value: serde_json::Value) -> McpConfigDocument {
        serde_json::from_value(value).unwrap()
    }

    fn global() -> McpConfigDocument {
        doc(json!({"mcpServers": {
            "filesystem": {
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-filesystem"]
            },
            "shared": {"command": "global-cmd", "env": {"FROM": "global"}}
        }}))
    }

    fn project() -> McpConfigDocument {
        doc(json!({"mcpServers": {
            "shared": {"command": "project-cmd"},
            "db": {"command": "uvx", "args": ["mcp-db"]}
        }}))
    }

    #[test]
    fn test_project_wins_and_order_is_global_first() {
        let master = build_master_list(&global(), Some(&project()), true, true);

        assert_eq!(
            master.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["filesystem", "shared", "db"]
        );
        assert_eq!(master["filesystem"].scope, Scope::Global);
        assert_eq!(master["shared"].scope, Scope::Project);
        assert_eq!(master["db"].scope, Scope::Project);

        // The project record replaces the global one entirely
        assert_eq!(
            serde_json::to_value(to_server_map(&master)).unwrap()["shared"],
            json!({"command": "project-cmd"})
        );
    }

    #[test]
    fn test_include_flags() {
        let global_only = build_master_list(&global(), Some(&project()), true, false);
        assert_eq!(
            global_only.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["filesystem", "shared"]
        );
        assert!(global_only.values().all(|entry| entry.scope == Scope::Global));

        let project_only = build_master_list(&global(), Some(&project()), false, true);
        assert_eq!(
            project_only.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["shared", "db"]
        );

        assert!(build_master_list(&global(), Some(&project()), false, false).is_empty());
    }

    #[test]
    fn test_missing_or_empty_project() {
        let without = build_master_list(&global(), None, true, true);
        let with_empty =
            build_master_list(&global(), Some(&McpConfigDocument::default()), true, true);

        assert_eq!(without, with_empty);
        assert_eq!(without.len(), 2);
    }
}
