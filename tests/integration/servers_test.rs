use crate::fixtures::TestFixture;
use predicates::prelude::*;
use serde_json::json;
use serial_test::serial;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial]
    fn test_add_server_with_flags() {
        let fixture = TestFixture::new().unwrap();

        fixture
            .cmd()
            .args([
                "add-server",
                "fs",
                "--cmd",
                "npx",
                "--args",
                "-y,@modelcontextprotocol/server-filesystem",
                "--env",
                "ROOT=/tmp, LEVEL=debug",
                "--scope",
                "global",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added 'fs' to global config"));

        assert_eq!(
            TestFixture::read_json(&fixture.global_path())["mcpServers"]["fs"],
            json!({
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-filesystem"],
                "env": {"ROOT": "/tmp", "LEVEL": "debug"}
            })
        );
    }

    #[test]
    #[serial]
    fn test_add_server_prompts_for_missing_values() {
        let fixture = TestFixture::new().unwrap();

        fixture
            .cmd()
            .args(["add-server", "db"])
            .write_stdin("3\n2\nuvx\nmcp-db, --verbose\nDB_URL=sqlite://x\n")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Invalid choice")
                    .and(predicate::str::contains("Enter server configuration for 'db'"))
                    .and(predicate::str::contains("Added 'db' to project config")),
            );

        assert_eq!(
            TestFixture::read_json(&fixture.project_path())["mcpServers"]["db"],
            json!(
                {"command": "uvx", "args": ["mcp-db", "--verbose"], "env": {"DB_URL": "sqlite://x"}}
            )
        );
    }

    #[test]
    #[serial]
    fn test_add_server_cancelled_on_end_of_input() {
        let fixture = TestFixture::new().unwrap();

        fixture
            .cmd()
            .args(["add-server", "db", "--scope", "global"])
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cancelled"));

        assert_eq!(TestFixture::read_json(&fixture.global_path()), json!({"mcpServers": {}}));
    }

    #[test]
    #[serial]
    fn test_add_server_rejects_bad_input() {
        let fixture = TestFixture::new().unwrap();

        fixture
            .cmd()
            .args(["add-server", "bad name", "--cmd", "x", "--scope", "global"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid server name"));

        fixture
            .cmd()
            .args(["add-server", "empty", "--cmd", " ", "--scope", "global"])
            .assert()
            .failure();
    }

    #[test]
    #[serial]
    fn test_list_and_remove_servers() {
        let fixture = TestFixture::new().unwrap();
        fixture
            .with_global(&json!({"mcpServers": {
                "shared": {"command": "global-cmd"},
                "alpha": {"command": "a", "env": {"TOKEN": "secret"}}
            }}))
            .unwrap();
        fixture
            .with_project(&json!({"mcpServers": {
                "shared": {"command": "project-cmd", "args": ["--x"]}
            }}))
            .unwrap();

        fixture.cmd().arg("list-servers").assert().success().stdout(
            predicate::str::contains("alpha (global)")
                .and(predicate::str::contains("Env: TOKEN=..."))
                .and(predicate::str::contains("shared (global, project)"))
                .and(predicate::str::contains("Command: project-cmd --x"))
                .and(predicate::str::contains("secret").not()),
        );

        fixture
            .cmd()
            .args(["remove-server", "shared", "--scope", "project"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 'shared' from project config"));
        fixture
            .cmd()
            .args(["remove-server", "shared"])
            .write_stdin("1\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 'shared' from global config"));
        fixture
            .cmd()
            .args(["remove-server", "shared", "--scope", "global"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Server 'shared' not found in global config"));

        assert_eq!(
            TestFixture::read_json(&fixture.global_path())["mcpServers"],
            json!({"alpha": {"command": "a", "env": {"TOKEN": "secret"}}})
        );
    }

    #[test]
    #[serial]
    fn test_list_servers_when_empty() {
        let fixture = TestFixture::new().unwrap();
        fixture.cmd().arg("list-servers").assert().success().stdout("No servers configured.\n");
    }
}
