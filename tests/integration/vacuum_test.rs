use crate::fixtures::TestFixture;
use predicates::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::path::PathBuf;

#[cfg(test)]
mod tests {
    use super::*;

    /// Two registered client files that disagree about `fs`.
    fn clashing_stores(fixture: &TestFixture) -> (PathBuf, PathBuf) {
        let first = fixture
            .with_store(
                "a/first.json",
                &json!({"mcpServers": {
                    "fs": {"command": "npx", "args": ["old"]},
                    "a-only": {"command": "a"}
                }}),
            )
            .unwrap();
        let second = fixture
            .with_store(
                "b/second.json",
                &json!({"mcpServers": {
                    "fs": {"command": "npx", "args": ["new"]},
                    "b-only": {"command": "b"}
                }}),
            )
            .unwrap();
        fixture.with_locations(&[first.to_str().unwrap(), second.to_str().unwrap()]).unwrap();
        (first, second)
    }

    #[test]
    #[serial]
    fn test_vacuum_auto_resolve_first() {
        let fixture = TestFixture::new().unwrap();
        clashing_stores(&fixture);

        fixture.cmd().args(["vacuum", "--auto-resolve", "first"]).assert().success().stdout(
            predicate::str::contains("Successfully imported 3 servers:")
                .and(predicate::str::contains("fs (from first)"))
                .and(predicate::str::contains("Resolved 1 conflicts:"))
                .and(predicate::str::contains("fs - kept version from first over second"))
                .and(predicate::str::contains("Vacuum complete!")),
        );

        let global = TestFixture::read_json(&fixture.global_path());
        assert_eq!(global["mcpServers"]["fs"], json!({"command": "npx", "args": ["old"]}));
        assert_eq!(global["mcpServers"]["b-only"], json!({"command": "b"}));
    }

    #[test]
    #[serial]
    fn test_vacuum_interactive_choice() {
        let fixture = TestFixture::new().unwrap();
        clashing_stores(&fixture);

        fixture.cmd().arg("vacuum").write_stdin("x\n2\n").assert().success().stdout(
            predicate::str::contains("Found 'fs' server in multiple locations:")
                .and(predicate::str::contains("Invalid choice. Please enter 1 or 2."))
                .and(predicate::str::contains("fs (from second)")),
        );

        let global = TestFixture::read_json(&fixture.global_path());
        assert_eq!(global["mcpServers"]["fs"], json!({"command": "npx", "args": ["new"]}));
    }

    #[test]
    #[serial]
    fn test_vacuum_cancelled_writes_nothing() {
        let fixture = TestFixture::new().unwrap();
        clashing_stores(&fixture);

        fixture
            .cmd()
            .arg("vacuum")
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::contains("Vacuum cancelled"));

        assert_eq!(TestFixture::read_json(&fixture.global_path()), json!({"mcpServers": {}}));
    }

    #[test]
    #[serial]
    fn test_vacuum_skip_existing_from_config_defaults() {
        let fixture = TestFixture::new().unwrap();
        clashing_stores(&fixture);
        fixture.with_global(&json!({"mcpServers": {"fs": {"command": "canonical"}}})).unwrap();
        std::fs::write(
            fixture.config.join("config.toml"),
            "[vacuum]\nauto-resolve = \"last\"\nskip-existing = true\n",
        )
        .unwrap();

        fixture.cmd().arg("vacuum").assert().success().stdout(
            predicate::str::contains("Skipped 1 existing servers:")
                .and(predicate::str::contains("Successfully imported 2 servers:")),
        );

        let global = TestFixture::read_json(&fixture.global_path());
        assert_eq!(global["mcpServers"]["fs"], json!({"command": "canonical"}));
        assert_eq!(global["mcpServers"]["a-only"], json!({"command": "a"}));
    }

    #[test]
    #[serial]
    fn test_vacuum_with_nothing_to_import() {
        let fixture = TestFixture::new().unwrap();
        fixture
            .cmd()
            .arg("vacuum")
            .assert()
            .success()
            .stdout(predicate::str::contains("No MCP servers found in any discovered locations."));
    }

    #[test]
    #[serial]
    fn test_vacuum_then_sync_converges() {
        let fixture = TestFixture::new().unwrap();
        let (first, second) = clashing_stores(&fixture);

        fixture.cmd().args(["vacuum", "--auto-resolve", "last"]).assert().success();
        fixture.cmd().arg("sync").assert().success();

        for store in [first, second] {
            let servers = TestFixture::read_json(&store)["mcpServers"].clone();
            assert_eq!(servers["fs"], json!({"command": "npx", "args": ["new"]}));
            assert_eq!(servers["a-only"], json!({"command": "a"}));
            assert_eq!(servers["b-only"], json!({"command": "b"}));
        }
        fixture
            .cmd()
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("All configurations are already in sync."));
    }
}
