use mcp_sync::clients::definitions::builtin_client_definitions;
use mcp_sync::clients::{ClientStateAdapter, CommandRunner, ProcessOutput, Timeouts};
use mcp_sync::registry::StoreDescriptor;
use mcp_sync::{sync_all, McpConfigDocument, Scope, SyncOptions, SyncOutcome};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// File-only runs must never spawn a process.
    struct NoProcesses;

    impl CommandRunner for NoProcesses {
        fn run(&self, argv: &[String], _timeout: Duration) -> ProcessOutput {
            panic!("unexpected process: {argv:?}");
        }
    }

    fn doc(value: Value) -> McpConfigDocument {
        serde_json::from_value(value).unwrap()
    }

    fn store(dir: &Path, name: &str, content: &Value) -> StoreDescriptor {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(content).unwrap()).unwrap();
        StoreDescriptor::manual(&path.to_string_lossy(), None)
    }

    fn read(store: &StoreDescriptor) -> Value {
        serde_json::from_str(&fs::read_to_string(&store.path).unwrap()).unwrap()
    }

    fn run(
        global: &McpConfigDocument,
        project: Option<&McpConfigDocument>,
        stores: &[StoreDescriptor],
        options: &SyncOptions,
    ) -> SyncOutcome {
        let definitions = builtin_client_definitions().unwrap();
        let adapter = ClientStateAdapter::new(&definitions, &NoProcesses, Timeouts::default());
        sync_all(global, project, stores.to_vec(), &adapter, options)
    }

    #[test]
    fn test_sync_all_across_file_stores() {
        let temp_dir = TempDir::new().unwrap();
        let global = doc(json!({"mcpServers": {
            "fs": {"command": "npx", "args": ["-y", "fs"]},
            "shared": {"command": "g"}
        }}));
        let project = doc(json!({"mcpServers": {"shared": {"command": "p"}}}));

        let stale = store(
            temp_dir.path(),
            "stale.json",
            &json!({"mcpServers": {"shared": {"command": "old"}, "mine": {"command": "m"}}}),
        );
        let current = store(
            temp_dir.path(),
            "current.json",
            &json!({"mcpServers": {
                "fs": {"command": "npx", "args": ["-y", "fs"]},
                "shared": {"command": "p"}
            }}),
        );
        let missing_path = temp_dir.path().join("missing.json");
        let missing = StoreDescriptor::manual(&missing_path.to_string_lossy(), None);
        let stores = vec![stale.clone(), missing.clone(), current.clone()];

        let outcome = run(&global, Some(&project), &stores, &SyncOptions::default());

        assert_eq!(outcome.updated_stores, vec![stale.path.clone()]);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].server, "shared");
        assert_eq!(outcome.conflicts[0].source, Scope::Project);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].store, missing.path);

        assert_eq!(
            read(&stale)["mcpServers"],
            json!({
                "mine": {"command": "m"},
                "fs": {"command": "npx", "args": ["-y", "fs"]},
                "shared": {"command": "p"}
            })
        );
        assert!(!Path::new(&missing.path).exists());
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let global = doc(json!({"mcpServers": {"fs": {"command": "npx"}}}));
        let target = store(temp_dir.path(), "a.json", &json!({"mcpServers": {}}));
        let before = fs::read_to_string(&target.path).unwrap();

        let options = SyncOptions { dry_run: true, ..SyncOptions::default() };
        let outcome = run(&global, None, &[target.clone()], &options);

        assert!(outcome.dry_run);
        assert_eq!(outcome.updated_stores, vec![target.path.clone()]);
        assert_eq!(fs::read_to_string(&target.path).unwrap(), before);
    }

    #[test]
    fn test_project_documents_are_never_targets() {
        let temp_dir = TempDir::new().unwrap();
        let global = doc(json!({"mcpServers": {"fs": {"command": "npx"}}}));
        let project_doc = store(temp_dir.path(), ".mcp.json", &json!({"mcpServers": {}}));

        let outcome = run(&global, None, &[project_doc.clone()], &SyncOptions::default());

        assert!(outcome.is_noop());
        assert_eq!(read(&project_doc), json!({"mcpServers": {}}));
    }

    fn server_maps() -> impl Strategy<Value = BTreeMap<String, (String, Vec<String>)>> {
        prop::collection::btree_map(
            "[a-z][a-z0-9]{0,6}",
            ("[a-z]{1,6}", prop::collection::vec("[a-z-]{1,5}", 0..3)),
            0..5,
        )
    }

    fn to_servers(map: &BTreeMap<String, (String, Vec<String>)>) -> Value {
        map.iter()
            .map(|(name, (command, args))| {
                (name.clone(), json!({"command": command, "args": args}))
            })
            .collect::<serde_json::Map<_, _>>()
            .into()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_second_sync_is_a_no_op(
            global in server_maps(),
            project in server_maps(),
            local in server_maps(),
        ) {
            let temp_dir = TempDir::new().unwrap();
            let global = doc(json!({"mcpServers": to_servers(&global)}));
            let project = doc(json!({"mcpServers": to_servers(&project)}));
            let target = store(
                temp_dir.path(),
                "client.json",
                &json!({"other": 1, "mcpServers": to_servers(&local)}),
            );

            run(&global, Some(&project), &[target.clone()], &SyncOptions::default());
            let after_first = fs::read_to_string(&target.path).unwrap();

            let second = run(&global, Some(&project), &[target.clone()], &SyncOptions::default());
            prop_assert!(second.is_noop());
            prop_assert_eq!(fs::read_to_string(&target.path).unwrap(), after_first);
            prop_assert_eq!(read(&target)["other"].clone(), json!(1));
        }
    }
}
