use super::definitions::{ClientDefinition, ClientDefinitions};
use super::executor::{CommandRunner, ProcessOutput, Timeouts};
use super::template::{split_words, CliScope, CommandTemplate, TemplateValues};
use crate::server::ServerSpec;
use crate::validation::{is_safe_executable, is_valid_server_name};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static SCOPE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)scope:\s*(\w+)").unwrap_or_else(|e| panic!("invalid scope pattern: {e}"))
});

/// Which template of a CLI client to use.
#[derive(Debug, Clone, Copy)]
enum Operation {
    List,
    Add,
    Remove,
    Get,
}

impl Operation {
    const fn key(self) -> &'static str {
        match self {
            Self::List => "list_mcp",
            Self::Add => "add_mcp",
            Self::Remove => "remove_mcp",
            Self::Get => "get_mcp",
        }
    }
}

/// Uniform list / add / remove / detect-scope over CLI-managed clients.
///
/// Every failure (unknown client, bad template, unsafe executable, timeout,
/// non-zero exit) is logged and reported as `None` / `false`.
pub struct ClientStateAdapter<'a> {
    definitions: &'a ClientDefinitions,
    runner: &'a dyn CommandRunner,
    timeouts: Timeouts,
}

impl<'a> ClientStateAdapter<'a> {
    pub fn new(
        definitions: &'a ClientDefinitions,
        runner: &'a dyn CommandRunner,
        timeouts: Timeouts,
    ) -> Self {
        Self { definitions, runner, timeouts }
    }

    /// Servers currently registered with `client_id`, or `None` if the client
    /// could not be queried.
    pub fn list_servers(&self, client_id: &str) -> Option<IndexMap<String, ServerSpec>> {
        let (definition, template) = self.template(client_id, Operation::List)?;
        let argv = render_or_warn(client_id, &template, &TemplateValues {
            command_args_style: definition.command_args_style,
            ..TemplateValues::default()
        })?;

        let output = self.runner.run(&argv, self.timeouts.mutation());
        if let Some(stdout) = output.success_stdout() {
            return Some(parse_server_list(stdout));
        }
        match output {
            ProcessOutput::Completed { stderr, .. } => {
                warn!("Listing servers for {client_id} failed: {}", stderr.trim());
                None
            },
            other => {
                warn!("Listing servers for {client_id} failed: {other:?}");
                None
            },
        }
    }

    /// Register `name` launching `command` (full argv) with `client_id`.
    pub fn add_server(
        &self,
        client_id: &str,
        name: &str,
        command: &[String],
        env: &IndexMap<String, String>,
        scope: CliScope,
    ) -> bool {
        if !is_valid_server_name(name) {
            warn!("Invalid server name: {name}");
            return false;
        }
        let Some(executable) = command.first().filter(|head| !head.is_empty()) else {
            warn!("Refusing to add {name} to {client_id}: empty command");
            return false;
        };
        if !is_safe_executable(executable) {
            warn!("Refusing to add {name} to {client_id}: unsafe executable {executable}");
            return false;
        }
        let Some((definition, template)) = self.template(client_id, Operation::Add) else {
            return false;
        };

        let values = TemplateValues {
            name: Some(name),
            scope: Some(scope),
            launch: Some(command),
            env: Some(env),
            command_args_style: definition.command_args_style,
        };
        let Some(argv) = render_or_warn(client_id, &template, &values) else {
            return false;
        };

        self.run_mutation(&argv, &format!("add MCP server {name} to {client_id}"))
    }

    /// Unregister `name` from `client_id`; the scope is detected when not given.
    pub fn remove_server(&self, client_id: &str, name: &str, scope: Option<CliScope>) -> bool {
        if !is_valid_server_name(name) {
            warn!("Invalid server name: {name}");
            return false;
        }
        let Some((definition, template)) = self.template(client_id, Operation::Remove) else {
            return false;
        };
        let scope = scope.unwrap_or_else(|| self.detect_scope(client_id, name));

        let values = TemplateValues {
            name: Some(name),
            scope: Some(scope),
            command_args_style: definition.command_args_style,
            ..TemplateValues::default()
        };
        let Some(argv) = render_or_warn(client_id, &template, &values) else {
            return false;
        };

        self.run_mutation(&argv, &format!("remove MCP server {name} from {client_id}"))
    }

    /// Scope `name` is registered under, falling back to [`CliScope::Local`].
    pub fn detect_scope(&self, client_id: &str, name: &str) -> CliScope {
        if !is_valid_server_name(name) {
            return CliScope::Local;
        }
        let Some((definition, template)) = self.template(client_id, Operation::Get) else {
            return CliScope::Local;
        };
        let values = TemplateValues {
            name: Some(name),
            command_args_style: definition.command_args_style,
            ..TemplateValues::default()
        };
        let Some(argv) = render_or_warn(client_id, &template, &values) else {
            return CliScope::Local;
        };

        let output = self.runner.run(&argv, self.timeouts.mutation());
        let scope = output.success_stdout().map_or(CliScope::Local, parse_scope);
        debug!("Detected scope {scope} for {name} in {client_id}");
        scope
    }

    /// True if the client's list executable answers `--version` successfully.
    pub fn is_available(&self, definition: &ClientDefinition) -> bool {
        let Some(list) = definition.cli_commands.as_ref().and_then(|c| c.list_mcp.as_deref()) else {
            debug!("No list_mcp command defined for {}", definition.name);
            return false;
        };
        let template = match CommandTemplate::parse(list) {
            Ok(template) => template,
            Err(e) => {
                warn!("Unusable list command for {}: {e}", definition.name);
                return false;
            },
        };

        let probe = [template.executable().to_string(), "--version".to_string()];
        match self.runner.run(&probe, self.timeouts.probe()) {
            output if output.success() => true,
            ProcessOutput::TimedOut => {
                warn!("Timeout checking CLI availability for {}", template.executable());
                false
            },
            other => {
                debug!("CLI {} not available: {other:?}", template.executable());
                false
            },
        }
    }

    fn template(
        &self,
        client_id: &str,
        operation: Operation,
    ) -> Option<(&'a ClientDefinition, CommandTemplate)> {
        let Some(definition) = self.definitions.get(client_id) else {
            warn!("Unknown client: {client_id}");
            return None;
        };
        let Some(commands) = definition.cli_commands.as_ref().filter(|_| definition.is_cli()) else {
            debug!("Client {client_id} is not a CLI client");
            return None;
        };
        let raw = match operation {
            Operation::List => commands.list_mcp.as_deref(),
            Operation::Add => commands.add_mcp.as_deref(),
            Operation::Remove => commands.remove_mcp.as_deref(),
            Operation::Get => commands.get_mcp.as_deref(),
        };
        let Some(raw) = raw else {
            warn!("No {} command for client {client_id}", operation.key());
            return None;
        };

        match CommandTemplate::parse(raw) {
            Ok(template) => Some((definition, template)),
            Err(e) => {
                warn!("Rejected {} command for client {client_id}: {e}", operation.key());
                None
            },
        }
    }

    fn run_mutation(&self, argv: &[String], action: &str) -> bool {
        match self.runner.run(argv, self.timeouts.mutation()) {
            output if output.success() => {
                info!("Succeeded to {action}");
                true
            },
            ProcessOutput::Completed { stderr, .. } => {
                warn!("Failed to {action}: {}", stderr.trim());
                false
            },
            other => {
                warn!("Failed to {action}: {other:?}");
                false
            },
        }
    }
}

fn render_or_warn(
    client_id: &str,
    template: &CommandTemplate,
    values: &TemplateValues<'_>,
) -> Option<Vec<String>> {
    match template.render(values) {
        Ok(argv) => Some(argv),
        Err(e) => {
            warn!("Cannot build command for {client_id}: {e}");
            None
        },
    }
}

/// Parse `name: command line` output, skipping anything that does not fit.
pub fn parse_server_list(output: &str) -> IndexMap<String, ServerSpec> {
    let mut servers = IndexMap::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((name, command_line)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if !is_valid_server_name(name) {
            debug!("Skipping list line: {line}");
            continue;
        }
        let command = match split_words(command_line.trim()) {
            Ok(words) if !words.is_empty() => words,
            _ => {
                debug!("Skipping unparseable command for {name}");
                continue;
            },
        };
        servers.insert(
            name.to_string(),
            ServerSpec { name: name.to_string(), command, args: Vec::new(), env: IndexMap::new() },
        );
    }
    servers
}

/// First known scope named after a `scope:` marker, or [`CliScope::Local`].
pub fn parse_scope(output: &str) -> CliScope {
    SCOPE_MARKER
        .captures_iter(output)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
        .unwrap_or_default()
}
