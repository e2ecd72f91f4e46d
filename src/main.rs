#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use mcp_sync::{
    app_config::AppConfig,
    bootstrap,
    cli::{self, AddServerArgs, Cli, SyncArgs},
    clients::{
        definitions::resolve_client_definitions, executor::run_interactive, template::join_words,
        ClientDefinitions, ClientStateAdapter, SystemRunner,
    },
    config::{writer, Config, McpServerConfig, ServerMap},
    discovery::{
        client_location, discover_stores, expand_path_template, platform_name, register_discovered,
    },
    registry::{FileLocationRegistry, LocationRegistry, LocationType, StoreDescriptor, CLI_PREFIX},
    scopes::ScopeStore,
    server::{Scope, ServerSpec},
    status::{scan_stores, server_status, StoreState},
    sync::{sync_all, SyncOptions, SyncOutcome},
    template::render_project_template,
    vacuum::{ImportOptions, InteractiveResolver, VacuumImporter},
    validation::{is_safe_executable, is_valid_env_key, is_valid_server_name},
    McpSyncError,
};
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use tracing::{debug, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Example written when the user has no client definitions file yet
const EXAMPLE_CLIENT_DEFINITIONS: &str = r#"{
  "clients": {
    "example-client": {
      "name": "Example Client",
      "description": "Example client configuration",
      "paths": {
        "darwin": "~/path/to/client/config.json",
        "windows": "%APPDATA%/Client/config.json",
        "linux": "~/.config/client/config.json"
      }
    }
  }
}
"#;

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.debug, cli.trace);

    let context = AppContext::load()?;
    debug!("Starting mcp-sync with {:?}", cli.command);

    dispatch_command(cli.command, &context)
}

/// Initialize tracing with the specified debug/trace flags
fn initialize_tracing(debug: bool, trace: bool) {
    let log_level = if trace {
        Level::TRACE
    } else if debug {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy())
        .init();
}

/// Everything a command needs, resolved once per run.
struct AppContext {
    config: Config,
    definitions: ClientDefinitions,
    app_config: AppConfig,
    runner: SystemRunner,
}

impl AppContext {
    fn load() -> Result<Self> {
        let config = Config::new().context("Failed to initialize configuration")?;
        let first_run = bootstrap::bootstrap_config(&config)?;

        let app_config = AppConfig::load_from(&config.app_config_path)
            .context("Failed to load app configuration")?
            .unwrap_or_default();
        debug!("Timeouts: {:?}", app_config.timeouts);

        let definitions = resolve_client_definitions(&config.client_definitions_path)
            .context("Failed to load client definitions")?;

        let context = Self { config, definitions, app_config, runner: SystemRunner };
        if first_run {
            let seeded = context.discovered_stores().context("Failed to seed config locations")?;
            debug!("Seeded {} config locations", seeded.len());
        }
        Ok(context)
    }

    fn adapter(&self) -> ClientStateAdapter<'_> {
        ClientStateAdapter::new(&self.definitions, &self.runner, self.app_config.timeouts)
    }

    fn registry(&self) -> FileLocationRegistry {
        FileLocationRegistry::new(&self.config.locations_path)
    }

    fn scopes(&self) -> ScopeStore {
        ScopeStore::from_config(&self.config)
    }

    /// Registered stores plus anything newly found on this machine.
    fn discovered_stores(&self) -> Result<Vec<StoreDescriptor>> {
        let adapter = self.adapter();
        register_discovered(&self.registry(), discover_stores(&self.definitions, &adapter))
    }
}

/// Dispatch to the appropriate command handler
fn dispatch_command(command: cli::Commands, context: &AppContext) -> Result<()> {
    match command {
        cli::Commands::Scan => run_scan(context),
        cli::Commands::Status => run_status(context),
        cli::Commands::Diff => run_diff(context),
        cli::Commands::AddLocation { path, name } => {
            run_add_location(context, &path, name.as_deref())
        },
        cli::Commands::RemoveLocation { path } => run_remove_location(context, &path),
        cli::Commands::ListLocations => run_list_locations(context),
        cli::Commands::Sync(args) => run_sync(context, args),
        cli::Commands::AddServer(args) => run_add_server(context, args),
        cli::Commands::RemoveServer { name, scope } => run_remove_server(context, &name, scope),
        cli::Commands::ListServers => run_list_servers(context),
        cli::Commands::Vacuum { auto_resolve, skip_existing } => {
            let options = context.app_config.vacuum.import_options(auto_resolve, skip_existing);
            run_vacuum(context, options)
        },
        cli::Commands::Init => run_init(context),
        cli::Commands::Template => run_template(),
        cli::Commands::ListClients => run_list_clients(context),
        cli::Commands::ClientInfo { client } => run_client_info(context, client.as_deref()),
        cli::Commands::EditClientDefinitions => run_edit_client_definitions(context),
    }
}

/// One-line rendering of how a server is launched.
fn describe_server(config: &McpServerConfig) -> String {
    match (&config.command, &config.url) {
        (Some(command), _) => {
            let argv: Vec<String> =
                command.to_argv().into_iter().chain(config.arg_strings()).collect();
            join_words(&argv)
        },
        (None, Some(url)) => url.clone(),
        (None, None) => "unknown".to_string(),
    }
}

fn location_label(store: &StoreDescriptor) -> &'static str {
    match (store.is_cli(), store.location_type) {
        (true, _) => "cli",
        (false, LocationType::Auto) => "auto",
        (false, LocationType::Manual) => "manual",
    }
}

fn print_servers(servers: &ServerMap) {
    if servers.is_empty() {
        println!("  None");
    }
    for (name, config) in servers {
        println!("  {name}: {}", describe_server(config));
    }
}

fn run_scan(context: &AppContext) -> Result<()> {
    println!("Scanning for MCP configurations...");
    let stores = context.discovered_stores()?;

    if stores.is_empty() {
        println!("No registered config locations found.");
        return Ok(());
    }

    for status in scan_stores(&stores, &context.adapter()) {
        println!("\n{} ({})", status.store.name, location_label(&status.store));
        println!("  Path: {}", status.store.path);
        match status.state {
            StoreState::Found(servers) => {
                println!("  Status: found");
                if servers.is_empty() {
                    println!("  Servers: none");
                } else {
                    let names: Vec<&str> = servers.keys().map(String::as_str).collect();
                    println!("  Servers: {}", names.join(", "));
                }
            },
            StoreState::NotFound => println!("  Status: not_found"),
            StoreState::Error(message) => println!("  Status: error: {message}"),
        }
    }
    Ok(())
}

fn run_status(context: &AppContext) -> Result<()> {
    let stores = context.registry().list_stores()?;
    let status = server_status(&context.scopes(), &stores, &context.adapter())?;

    println!("Server Status:");
    println!("\nGlobal Servers:");
    print_servers(&status.global);
    println!("\nProject Servers:");
    print_servers(&status.project.unwrap_or_default());

    println!("\nLocation Status:");
    if status.stores.is_empty() {
        println!("  No registered locations");
    }
    for store_status in status.stores {
        let name = &store_status.store.name;
        match store_status.state {
            StoreState::Found(servers) if servers.is_empty() => println!("  {name}: No servers"),
            StoreState::Found(servers) => println!("  {name}: {} servers", servers.len()),
            StoreState::NotFound => println!("  {name}: Not found"),
            StoreState::Error(message) => println!("  {name}: ERROR reading config ({message})"),
        }
    }
    Ok(())
}

fn run_sync_pass(context: &AppContext, options: &SyncOptions) -> Result<SyncOutcome> {
    let scopes = context.scopes();
    let global = scopes.read(Scope::Global)?;
    let project = scopes.read_project()?;
    let stores = context.registry().list_stores()?;
    Ok(sync_all(&global, project.as_ref(), stores, &context.adapter(), options))
}

fn print_errors(outcome: &SyncOutcome) {
    if outcome.errors.is_empty() {
        return;
    }
    println!("\nErrors ({}):", outcome.errors.len());
    for error in &outcome.errors {
        println!("  {}: {}", error.store, error.message);
    }
}

fn run_diff(context: &AppContext) -> Result<()> {
    println!("Checking for differences...");
    let outcome = run_sync_pass(context, &SyncOptions { dry_run: true, ..SyncOptions::default() })?;

    if outcome.is_noop() {
        println!("All configurations are in sync.");
        return Ok(());
    }

    if !outcome.updated_stores.is_empty() {
        println!("\nLocations that would be updated:");
        for store in &outcome.updated_stores {
            println!("  {store}");
        }
    }
    if !outcome.conflicts.is_empty() {
        println!("\nConflicts detected:");
        for conflict in &outcome.conflicts {
            println!("  Server '{}' in {}", conflict.server, conflict.store);
            println!("    Master ({}) would replace it", conflict.source);
        }
    }
    print_errors(&outcome);
    Ok(())
}

fn run_sync(context: &AppContext, args: SyncArgs) -> Result<()> {
    println!("Syncing configurations...");
    let options = SyncOptions {
        dry_run: args.dry_run,
        global_only: args.global_only,
        project_only: args.project_only,
        location: args.location,
    };
    let outcome = run_sync_pass(context, &options)?;

    if outcome.dry_run {
        println!("DRY RUN - No changes made");
    }

    if !outcome.updated_stores.is_empty() {
        let action = if outcome.dry_run { "Would update" } else { "Updated" };
        println!("\n{action} {} locations:", outcome.updated_stores.len());
        for store in &outcome.updated_stores {
            println!("  {store}");
        }
    }
    if !outcome.conflicts.is_empty() {
        println!("\nConflicts detected ({}):", outcome.conflicts.len());
        for conflict in &outcome.conflicts {
            println!("  Server '{}' in {}", conflict.server, conflict.store);
            println!("    Resolved using {} config", conflict.source);
        }
    }
    print_errors(&outcome);

    if outcome.is_noop() {
        println!("All configurations are already in sync.");
    }
    Ok(())
}

fn run_add_location(context: &AppContext, path: &str, name: Option<&str>) -> Result<()> {
    let path = if path.starts_with(CLI_PREFIX) {
        path.to_string()
    } else {
        expand_path_template(path).to_string_lossy().into_owned()
    };

    if context.registry().add_store(StoreDescriptor::manual(&path, name))? {
        println!("Added location: {path}");
        if let Some(name) = name {
            println!("  Name: {name}");
        }
    } else {
        println!("Location already exists: {path}");
    }
    Ok(())
}

fn run_remove_location(context: &AppContext, path: &str) -> Result<()> {
    if context.registry().remove_store(path)? {
        println!("Removed location: {path}");
    } else {
        println!("Location not found: {path}");
    }
    Ok(())
}

fn run_list_locations(context: &AppContext) -> Result<()> {
    let stores = context.registry().list_stores()?;
    if stores.is_empty() {
        println!("No registered locations.");
        return Ok(());
    }

    println!("Registered config locations:");
    for store in stores {
        println!("  {} ({})", store.name, location_label(&store));
        println!("    Path: {}", store.path);
    }
    Ok(())
}

/// Print `message` and read one trimmed line. End of input cancels.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<String> {
    write!(output, "{message}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(McpSyncError::Cancelled.into());
    }
    Ok(line.trim().to_string())
}

fn prompt_for_scope<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    heading: &str,
) -> Result<Scope> {
    writeln!(output, "{heading}")?;
    writeln!(output, "1. Global config")?;
    writeln!(output, "2. Project config")?;
    loop {
        match prompt(input, output, "Choose (1 or 2): ")?.as_str() {
            "1" => return Ok(Scope::Global),
            "2" => return Ok(Scope::Project),
            _ => writeln!(output, "Invalid choice")?,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty()).map(str::to_string).collect()
}

/// `KEY=value` pairs; malformed pairs and invalid keys are dropped with a warning.
fn parse_env_pairs(pairs: &[String]) -> IndexMap<String, String> {
    let mut env = IndexMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            warn!("Ignoring environment entry without '=': {pair}");
            continue;
        };
        let key = key.trim();
        if !is_valid_env_key(key) {
            warn!("Ignoring invalid environment variable name: {key}");
            continue;
        }
        env.insert(key.to_string(), value.trim().to_string());
    }
    env
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<McpSyncError>(), Some(McpSyncError::Cancelled))
}

/// Scope and entry from the flags, prompting for whatever they leave out.
fn collect_server<R: BufRead, W: Write>(
    args: &AddServerArgs,
    input: &mut R,
    output: &mut W,
) -> Result<(Scope, McpServerConfig)> {
    let scope = match args.scope {
        Some(scope) => scope,
        None => prompt_for_scope(input, output, "Add server to:")?,
    };

    if let Some(command) = &args.command {
        let server_args = args.args.iter().map(|arg| arg.trim().to_string()).collect();
        let env = parse_env_pairs(&args.env);
        return Ok((scope, McpServerConfig::stdio(command.trim(), server_args).with_env(env)));
    }

    writeln!(output, "\nEnter server configuration for '{}':", args.name)?;
    let command = prompt(input, output, "Command: ")?;
    let server_args = split_list(&prompt(input, output, "Args (comma-separated): ")?);
    let env_line =
        prompt(input, output, "Environment variables (KEY=value, comma-separated, optional): ")?;

    let env = parse_env_pairs(&split_list(&env_line));
    Ok((scope, McpServerConfig::stdio(command, server_args).with_env(env)))
}

fn run_add_server(context: &AppContext, args: AddServerArgs) -> Result<()> {
    if !is_valid_server_name(&args.name) {
        return Err(McpSyncError::Config(format!(
            "Invalid server name '{}': use letters, digits, '-' and '_'",
            args.name
        ))
        .into());
    }

    let collected = collect_server(&args, &mut io::stdin().lock(), &mut io::stdout());
    let (scope, config) = match collected {
        Ok(collected) => collected,
        Err(e) if is_cancelled(&e) => {
            println!("\nCancelled");
            return Ok(());
        },
        Err(e) => return Err(e),
    };

    if let Err(e) = ServerSpec::from_config(&args.name, &config) {
        return Err(McpSyncError::Config(e.to_string()).into());
    }

    context.scopes().add_server(scope, &args.name, config)?;
    println!("Added '{}' to {scope} config", args.name);
    Ok(())
}

fn run_remove_server(context: &AppContext, name: &str, scope: Option<Scope>) -> Result<()> {
    let scope = match scope {
        Some(scope) => scope,
        None => {
            let heading = format!("Remove server '{name}' from:");
            match prompt_for_scope(&mut io::stdin().lock(), &mut io::stdout(), &heading) {
                Ok(scope) => scope,
                Err(e) if is_cancelled(&e) => {
                    println!("\nCancelled");
                    return Ok(());
                },
                Err(e) => return Err(e),
            }
        },
    };

    if context.scopes().remove_server(scope, name)? {
        println!("Removed '{name}' from {scope} config");
    } else {
        println!("Server '{name}' not found in {scope} config");
    }
    Ok(())
}

fn run_list_servers(context: &AppContext) -> Result<()> {
    let scopes = context.scopes();
    let global = scopes.read(Scope::Global)?.servers();
    let project = scopes.read_project()?.map(|document| document.servers()).unwrap_or_default();

    let names: BTreeSet<&String> = global.keys().chain(project.keys()).collect();
    if names.is_empty() {
        println!("No servers configured.");
        return Ok(());
    }

    println!("Configured servers:");
    for name in names {
        let mut sources = Vec::new();
        if global.contains_key(name) {
            sources.push("global");
        }
        if project.contains_key(name) {
            sources.push("project");
        }
        println!("  {name} ({})", sources.join(", "));

        let Some(config) = project.get(name).or_else(|| global.get(name)) else {
            continue;
        };
        println!("    Command: {}", describe_server(config));
        if !config.env.is_empty() {
            let env: Vec<String> = config.env.keys().map(|key| format!("{key}=...")).collect();
            println!("    Env: {}", env.join(", "));
        }
    }
    Ok(())
}

fn run_vacuum(context: &AppContext, options: ImportOptions) -> Result<()> {
    let stores = context.discovered_stores()?;
    let adapter = context.adapter();
    let mut resolver = InteractiveResolver::new(io::stdin().lock(), io::stdout());

    let outcome = match VacuumImporter::new(&adapter).import_all(
        &stores,
        &context.config.global_config_path,
        options,
        &mut resolver,
    ) {
        Ok(outcome) => outcome,
        Err(e) if is_cancelled(&e) => {
            println!("\nVacuum cancelled");
            return Ok(());
        },
        Err(e) => return Err(e),
    };

    if outcome.imported.is_empty() && outcome.conflicts.is_empty() && outcome.skipped.is_empty() {
        println!("No MCP servers found in any discovered locations.");
        for error in &outcome.errors {
            println!("  {}: {}", error.store, error.message);
        }
        return Ok(());
    }

    if !outcome.imported.is_empty() {
        println!("Successfully imported {} servers:", outcome.imported.len());
        for (name, source) in &outcome.imported {
            println!("  {name} (from {source})");
        }
    }
    if !outcome.conflicts.is_empty() {
        println!("\nResolved {} conflicts:", outcome.conflicts.len());
        for conflict in &outcome.conflicts {
            println!(
                "  {} - kept version from {} over {}",
                conflict.server, conflict.chosen_source, conflict.rejected_source
            );
        }
    }
    if !outcome.skipped.is_empty() {
        println!("\nSkipped {} existing servers:", outcome.skipped.len());
        for name in &outcome.skipped {
            println!("  {name}");
        }
    }
    if !outcome.errors.is_empty() {
        println!("\nErrors ({}):", outcome.errors.len());
        for error in &outcome.errors {
            println!("  {}: {}", error.store, error.message);
        }
    }

    println!("\nVacuum complete! Run 'mcp-sync sync' to standardize all configs.");
    Ok(())
}

fn run_init(context: &AppContext) -> Result<()> {
    if context.scopes().init_project()? {
        println!("Created .mcp.json in current directory");
    } else {
        println!(".mcp.json already exists");
    }
    Ok(())
}

fn run_template() -> Result<()> {
    println!("MCP Configuration Template:");
    println!("{}", render_project_template()?);
    Ok(())
}

fn run_list_clients(context: &AppContext) -> Result<()> {
    if context.definitions.clients.is_empty() {
        println!("No client definitions found.");
        return Ok(());
    }

    let adapter = context.adapter();
    let platform = platform_name();
    println!("Supported Clients:");
    for (id, definition) in &context.definitions.clients {
        let found = client_location(id, definition, &adapter, platform).is_some();
        println!("  {id}: {} - {}", definition.name, if found { "Found" } else { "Not found" });
        if !definition.description.is_empty() {
            println!("    {}", definition.description);
        }
    }
    Ok(())
}

fn run_client_info(context: &AppContext, client: Option<&str>) -> Result<()> {
    let Some(client_id) = client else {
        println!("Available clients:");
        for id in context.definitions.clients.keys() {
            println!("  {id}");
        }
        return Ok(());
    };

    let Some(definition) = context.definitions.get(client_id) else {
        println!("Client '{client_id}' not found.");
        println!("Use 'mcp-sync list-clients' to see available clients.");
        return Ok(());
    };

    println!("Client: {}", definition.name);
    if !definition.description.is_empty() {
        println!("Description: {}", definition.description);
    }
    println!("Type: {}", if definition.is_cli() { "cli" } else { "file" });

    if !definition.paths.is_empty() {
        println!("\nPaths:");
        for (platform, path) in &definition.paths {
            println!("  {platform}: {path}");
        }
    }
    if let Some(commands) = &definition.cli_commands {
        println!("\nCommands:");
        for (label, template) in [
            ("list", &commands.list_mcp),
            ("add", &commands.add_mcp),
            ("remove", &commands.remove_mcp),
            ("get", &commands.get_mcp),
        ] {
            if let Some(template) = template {
                println!("  {label}: {template}");
            }
        }
    }

    let platform = platform_name();
    match client_location(client_id, definition, &context.adapter(), platform) {
        Some(store) => println!("\nFound on this system: {}", store.path),
        None => {
            println!("\nNot found on this system");
            if let Some(template) = definition.path_template(platform) {
                println!("Expected location: {}", expand_path_template(template).display());
            }
        },
    }
    Ok(())
}

fn run_edit_client_definitions(context: &AppContext) -> Result<()> {
    let path = &context.config.client_definitions_path;
    if !path.exists() {
        let example: serde_json::Value = serde_json::from_str(EXAMPLE_CLIENT_DEFINITIONS)
            .context("Failed to parse example definitions")?;
        writer::write_json(path, &example)?;
        println!("Created user client definitions file with example.");
    }
    println!("Opening: {}", path.display());

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    if !is_safe_executable(&editor) {
        warn!("Unsafe editor name: {editor}");
        println!("Editor name contains unsafe characters: {editor}");
        println!("Only alphanumeric characters, dots, hyphens, and underscores are allowed.");
        println!("Please manually edit: {}", path.display());
        return Ok(());
    }

    let argv = vec![editor, path.to_string_lossy().into_owned()];
    if run_interactive(&argv, context.app_config.timeouts.editor()) {
        println!("Client definitions updated. Run 'mcp-sync scan' to reload.");
    } else {
        println!("Editor '{}' did not finish successfully.", argv[0]);
        println!("Please manually edit: {}", path.display());
    }
    Ok(())
}
