use crate::server::Scope;
use crate::vacuum::AutoResolve;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-sync",
    about = "Keep MCP server configurations in sync across AI clients",
    long_about = "mcp-sync keeps one master list of MCP (Model Context Protocol) servers and
pushes it into every AI client that has a config on this machine.

The master list is built from:
  • $XDG_CONFIG_HOME/mcp-sync/global.json (or ~/.config/mcp-sync/global.json)
  • ./.mcp.json in the current directory (project servers win on name clashes)

Other files in $XDG_CONFIG_HOME/mcp-sync/:
  • locations.json: registered client configs (file paths or cli:<client>)
  • client_definitions.json: your client definitions, overriding the built-ins
  • config.toml: timeouts and vacuum defaults

File-based clients keep servers they have that the master list does not.
CLI-managed clients (such as Claude Code) are mirrored exactly.",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output (shows INFO and DEBUG messages)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace output (shows all log messages including TRACE)
    #[arg(short = 't', long, global = true)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover client configs on this machine and show what they hold
    Scan,

    /// Show global, project, and per-location servers
    Status,

    /// Show what `sync` would change, without writing anything
    Diff,

    /// Register a config file to keep in sync
    AddLocation {
        /// Path to the config file, or cli:<client-id>
        path: String,

        /// Friendly name for the location
        #[arg(long)]
        name: Option<String>,
    },

    /// Unregister a config location
    RemoveLocation {
        /// Path exactly as listed by `list-locations`
        path: String,
    },

    /// Show all registered config locations
    ListLocations,

    /// Push the master server list into every registered location
    #[command(long_about = "Push the master server list into every registered location.

Project documents (.mcp.json) are sources only and are never written by sync.
A server that differs from the master list is overwritten and reported as a
conflict.

Examples:
  # Sync everything
  mcp-sync sync

  # Preview changes without writing
  mcp-sync sync --dry-run

  # Sync one location only
  mcp-sync sync --location cli:claude-code")]
    Sync(SyncArgs),

    /// Add a server to the global or project config
    AddServer(AddServerArgs),

    /// Remove a server from the global or project config
    RemoveServer {
        /// Server name
        name: String,

        /// Config scope (prompts when omitted)
        #[arg(long, value_enum)]
        scope: Option<Scope>,
    },

    /// Show all servers in the master list
    ListServers,

    /// Import servers from every discovered location into the global config
    #[command(long_about = "Import servers from every discovered location into the global config.

When the same server name appears with different definitions, you are asked
which one to keep unless --auto-resolve is given.

Examples:
  # Import, asking about each clash
  mcp-sync vacuum

  # Keep the first definition seen, leave existing global servers alone
  mcp-sync vacuum --auto-resolve first --skip-existing")]
    Vacuum {
        /// Resolve clashes automatically
        #[arg(long, value_enum)]
        auto_resolve: Option<AutoResolve>,

        /// Skip servers that already exist in the global config
        #[arg(long)]
        skip_existing: bool,
    },

    /// Create an empty .mcp.json in the current directory
    Init,

    /// Print an example project config
    Template,

    /// Show all supported clients and whether they are on this machine
    ListClients,

    /// Show detailed information about one client
    ClientInfo {
        /// Client id (lists ids when omitted)
        client: Option<String>,
    },

    /// Open your client definitions in $EDITOR
    EditClientDefinitions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Only sync global servers
    #[arg(long, conflicts_with = "project_only")]
    pub global_only: bool,

    /// Only sync project servers
    #[arg(long)]
    pub project_only: bool,

    /// Sync this location only
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddServerArgs {
    /// Server name
    pub name: String,

    /// Command to run the server (prompts when omitted)
    #[arg(long = "cmd")]
    pub command: Option<String>,

    /// Command arguments (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Environment variables (KEY=value,KEY2=value2)
    #[arg(long, value_delimiter = ',')]
    pub env: Vec<String>,

    /// Config scope (prompts when omitted)
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,
}
