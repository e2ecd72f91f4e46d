use regex::Regex;
use std::sync::LazyLock;

/// Executables we are willing to spawn: a bare program name, no paths or shell syntax.
static EXECUTABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap_or_else(|e| panic!("invalid executable pattern: {e}"))
});

static SERVER_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|e| panic!("invalid server name pattern: {e}"))
});

static ENV_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .unwrap_or_else(|e| panic!("invalid env key pattern: {e}"))
});

/// Returns true if `command` is safe to use as the program of a spawned process.
#[must_use]
pub fn is_safe_executable(command: &str) -> bool {
    EXECUTABLE_PATTERN.is_match(command)
}

/// Returns true if `name` may be passed to a client CLI as a server name.
#[must_use]
pub fn is_valid_server_name(name: &str) -> bool {
    SERVER_NAME_PATTERN.is_match(name)
}

/// Returns true if `key` is a portable environment variable identifier.
#[must_use]
pub fn is_valid_env_key(key: &str) -> bool {
    ENV_KEY_PATTERN.is_match(key)
}
