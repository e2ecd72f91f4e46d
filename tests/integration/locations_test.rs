use crate::fixtures::TestFixture;
use predicates::prelude::*;
use serial_test::serial;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial]
    fn test_add_list_remove_location() {
        let fixture = TestFixture::new().unwrap();
        let store = fixture
            .with_store("clients/editor.json", &serde_json::json!({"mcpServers": {}}))
            .unwrap();
        let store = store.to_string_lossy().into_owned();

        fixture
            .cmd()
            .args(["add-location", &store, "--name", "Editor"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Added location: {store}")).and(
                predicate::str::contains("Name: Editor")
            ));

        fixture
            .cmd()
            .args(["add-location", &store])
            .assert()
            .success()
            .stdout(predicate::str::contains("Location already exists"));

        fixture.cmd().arg("list-locations").assert().success().stdout(
            predicate::str::contains("Editor (manual)").and(
                predicate::str::contains(format!("Path: {store}")),
            ),
        );

        let registry = TestFixture::read_json(&fixture.config.join("locations.json"));
        assert_eq!(registry["locations"][0]["path"], store.as_str());
        assert_eq!(registry["locations"][0]["type"], "manual");

        fixture
            .cmd()
            .args(["remove-location", &store])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed location"));
        fixture
            .cmd()
            .args(["remove-location", &store])
            .assert()
            .success()
            .stdout(predicate::str::contains("Location not found"));
    }

    #[test]
    #[serial]
    fn test_add_location_expands_home() {
        let fixture = TestFixture::new().unwrap();

        fixture.cmd().args(["add-location", "~/.tool/mcp.json"]).assert().success();

        let registry = TestFixture::read_json(&fixture.config.join("locations.json"));
        let expected = fixture.home.join(".tool/mcp.json");
        assert_eq!(registry["locations"][0]["path"], expected.to_string_lossy().as_ref());
        assert_eq!(registry["locations"][0]["name"], "mcp");
    }

    #[test]
    #[serial]
    fn test_malformed_registry_is_an_error() {
        let fixture = TestFixture::new().unwrap();
        std::fs::write(fixture.config.join("locations.json"), "{\"locations\": 3}").unwrap();

        fixture.cmd().arg("list-locations").assert().failure().stderr(
            predicate::str::contains("Failed to parse"),
        );
    }

    #[test]
    #[serial]
    #[cfg(unix)]
    fn test_scan_registers_discovered_clients() {
        let fixture = TestFixture::new().unwrap();
        let cursor = fixture.home.join(".cursor/mcp.json");
        std::fs::create_dir_all(cursor.parent().unwrap()).unwrap();
        std::fs::write(
            &cursor,
            r#"{"mcpServers": {"fs": {"command": "npx"}, "git": {"command": "uvx"}}}"#,
        )
        .unwrap();

        fixture.cmd().arg("scan").assert().success().stdout(
            predicate::str::contains("cursor (auto)")
                .and(predicate::str::contains("Status: found"))
                .and(predicate::str::contains("Servers: fs, git")),
        );

        let registry = TestFixture::read_json(&fixture.config.join("locations.json"));
        assert_eq!(registry["locations"].as_array().map(Vec::len), Some(1));
        assert_eq!(registry["locations"][0]["type"], "auto");
        assert_eq!(registry["locations"][0]["client_name"], "Cursor");
    }

    #[test]
    #[serial]
    fn test_status_reports_each_location() {
        let fixture = TestFixture::new().unwrap();
        fixture
            .with_global(&serde_json::json!({"mcpServers": {
                "fs": {"command": "npx", "args": ["-y", "fs"]}
            }}))
            .unwrap();
        let found = fixture
            .with_store("a/found.json", &serde_json::json!({"mcpServers": {"x": {"command": "x"}}}))
            .unwrap();
        let missing = fixture.temp.path().join("missing.json");
        fixture
            .with_locations(&[found.to_str().unwrap(), missing.to_str().unwrap()])
            .unwrap();

        fixture.cmd().arg("status").assert().success().stdout(
            predicate::str::contains("Global Servers:\n  fs: npx -y fs")
                .and(predicate::str::contains("Project Servers:\n  None"))
                .and(predicate::str::contains("found: 1 servers"))
                .and(predicate::str::contains("missing: Not found")),
        );
    }
}
