#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Test fixture for an isolated mcp-sync installation
pub struct TestFixture {
    /// Temporary directory that will be cleaned up on drop
    pub temp: TempDir,
    /// Path to the config directory (`XDG_CONFIG_HOME/mcp-sync`)
    pub config: PathBuf,
    /// Working directory holding the project `.mcp.json`
    pub project: PathBuf,
    /// Fake home directory, so client discovery never sees the real machine
    pub home: PathBuf,
    /// Only directory on `PATH` for the binary under test
    pub bin: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directories
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join("config").join("mcp-sync");
        let project_dir = temp_dir.path().join("project");
        let home_dir = temp_dir.path().join("home");
        let bin_dir = temp_dir.path().join("bin");

        for dir in [&config_dir, &project_dir, &home_dir, &bin_dir] {
            fs::create_dir_all(dir)?;
        }

        Ok(Self {
            temp: temp_dir,
            config: config_dir,
            project: project_dir,
            home: home_dir,
            bin: bin_dir,
        })
    }

    /// Get the config home directory (parent of the mcp-sync config)
    pub fn config_home(&self) -> PathBuf {
        self.config.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    pub fn global_path(&self) -> PathBuf {
        self.config.join("global.json")
    }

    pub fn project_path(&self) -> PathBuf {
        self.project.join(".mcp.json")
    }

    /// The binary, isolated from the host's config, home, and executables
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-sync"));
        cmd.current_dir(&self.project)
            .env("XDG_CONFIG_HOME", self.config_home())
            .env("HOME", &self.home)
            .env("PATH", &self.bin)
            .env_remove("RUST_LOG")
            .env_remove("EDITOR");
        cmd
    }

    /// Create the global scope document
    pub fn with_global(&self, content: &Value) -> std::io::Result<&Self> {
        fs::write(self.global_path(), content.to_string())?;
        Ok(self)
    }

    /// Create the project scope document
    pub fn with_project(&self, content: &Value) -> std::io::Result<&Self> {
        fs::write(self.project_path(), content.to_string())?;
        Ok(self)
    }

    /// Write a client config file somewhere under the temp dir and return its path
    pub fn with_store(&self, relative: &str, content: &Value) -> std::io::Result<PathBuf> {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content.to_string())?;
        Ok(path)
    }

    /// Register locations by writing `locations.json` directly
    pub fn with_locations(&self, paths: &[&str]) -> std::io::Result<&Self> {
        let locations: Vec<Value> = paths
            .iter()
            .map(|path| {
                let name = Path::new(path)
                    .file_stem()
                    .map_or_else(
                        || (*path).to_string(),
                        |stem| stem.to_string_lossy().into_owned(),
                    );
                serde_json::json!({"path": path, "name": name, "type": "manual"})
            })
            .collect();
        fs::write(
            self.config.join("locations.json"),
            serde_json::json!({ "locations": locations }).to_string(),
        )?;
        Ok(self)
    }

    /// Create the user client definitions file
    pub fn with_client_definitions(&self, content: &Value) -> std::io::Result<&Self> {
        fs::write(self.config.join("client_definitions.json"), content.to_string())?;
        Ok(self)
    }

    /// Install a fake `claude` executable on `PATH`.
    ///
    /// It appends every invocation to `claude.log`, answers `mcp list` from
    /// `claude.list`, and exits with `version_exit` for `--version`.
    #[cfg(unix)]
    pub fn with_fake_claude(&self, list: &str, version_exit: i32) -> std::io::Result<&Self> {
        use std::os::unix::fs::PermissionsExt;

        let log = self.temp.path().join("claude.log");
        let list_file = self.temp.path().join("claude.list");
        fs::write(&list_file, list)?;

        let script = format!(
            r#"#!/bin/sh
echo "$*" >> "{log}"
if [ "$1" = "--version" ]; then
  exit {version_exit}
fi
if [ "$1 $2" = "mcp list" ]; then
  while IFS= read -r line; do echo "$line"; done < "{list}"
  exit 0
fi
if [ "$1 $2" = "mcp get" ]; then
  echo "Scope: User config (available in all your projects)"
fi
exit 0
"#,
            log = log.display(),
            list = list_file.display(),
        );
        let path = self.bin.join("claude");
        fs::write(&path, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(self)
    }

    /// Lines the fake `claude` was invoked with
    pub fn claude_calls(&self) -> Vec<String> {
        fs::read_to_string(self.temp.path().join("claude.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Parse a JSON file written by the binary
    pub fn read_json(path: &Path) -> Value {
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
        serde_json::from_str(&content).unwrap_or_else(|e| panic!("parse {}: {e}", path.display()))
    }
}
