use crate::clients::{ClientDefinition, ClientDefinitions, ClientStateAdapter};
use crate::registry::{LocationRegistry, LocationType, StoreDescriptor, StoreKind, CLI_PREFIX};
use anyhow::{anyhow, Result};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

// %VAR%, ${VAR} or $VAR
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"%([A-Za-z_][A-Za-z0-9_]*)%",
        r"|\$\{([A-Za-z_][A-Za-z0-9_]*)\}",
        r"|\$([A-Za-z_][A-Za-z0-9_]*)",
    ))
    .unwrap_or_else(|e| panic!("invalid env reference pattern: {e}"))
});

/// Platform key used in client definition path tables.
pub fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "windows",
        _ => "linux",
    }
}

/// Expand a client path template against the real environment.
pub fn expand_path_template(template: &str) -> PathBuf {
    let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    expand_path_with(template, home.as_deref(), |name| std::env::var(name).ok())
}

/// Expand a leading `~/` and `%VAR%` / `$VAR` / `${VAR}` references.
///
/// Unknown variables are left as written.
pub fn expand_path_with<F>(template: &str, home: Option<&Path>, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let expanded = ENV_REFERENCE.replace_all(template, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        lookup(name).unwrap_or_else(|| caps[0].to_string())
    });

    match (expanded.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(expanded.as_ref()),
    }
}

/// Store descriptor for `client_id` if the client is present on this machine.
///
/// File clients are present when their expanded path exists; CLI clients
/// when their executable answers the availability probe.
pub fn client_location(
    client_id: &str,
    definition: &ClientDefinition,
    adapter: &ClientStateAdapter<'_>,
    platform: &str,
) -> Option<StoreDescriptor> {
    let (path, config_type) = if definition.is_cli() {
        if !adapter.is_available(definition) {
            return None;
        }
        (format!("{CLI_PREFIX}{client_id}"), StoreKind::Cli)
    } else {
        let template = definition.path_template(platform)?;
        let path = expand_path_template(template);
        if !path.exists() {
            debug!("{client_id}: {} not found", path.display());
            return None;
        }
        (path.to_string_lossy().into_owned(), StoreKind::File)
    };

    Some(StoreDescriptor {
        path,
        name: client_id.to_string(),
        location_type: LocationType::Auto,
        config_type,
        client_name: Some(definition.name.clone()),
        description: Some(definition.description.clone()),
        scope: None,
    })
}

/// Every client from `definitions` found on this machine, in definition order.
pub fn discover_stores(
    definitions: &ClientDefinitions,
    adapter: &ClientStateAdapter<'_>,
) -> Vec<StoreDescriptor> {
    let platform = platform_name();
    definitions
        .clients
        .iter()
        .filter_map(|(id, definition)| client_location(id, definition, adapter, platform))
        .collect()
}

/// Registered stores followed by any newly discovered ones.
///
/// New discoveries are appended to the registry as a side effect.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or updated.
pub fn register_discovered(
    registry: &dyn LocationRegistry,
    discovered: Vec<StoreDescriptor>,
) -> Result<Vec<StoreDescriptor>> {
    let mut stores = registry.list_stores()?;
    for store in discovered {
        if stores.iter().any(|known| known.path == store.path) {
            continue;
        }
        if !registry.add_store(store.clone())? {
            return Err(anyhow!("Registry refused new location {}", store.path));
        }
        info!("Registered newly discovered location {}", store.path);
        stores.push(store);
    }
    Ok(stores)
}
