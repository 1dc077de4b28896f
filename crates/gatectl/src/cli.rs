//! Clap derive structures for the `gatectl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gatectl_core::{RouteRef, TargetKind, WriteMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatectl -- edit an agent gateway's configuration document
#[derive(Debug, Parser)]
#[command(
    name = "gatectl",
    version,
    about = "Edit agent gateway configuration from the command line",
    long_about = "Inspect and edit the declarative configuration document of an \
        agent/MCP gateway through its management API.\n\n\
        Every edit re-reads the live document, applies one change, writes the \
        whole document back, and re-reads it to confirm.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "GATECTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Management API URL (overrides profile)
    #[arg(long, short = 'u', env = "GATECTL_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token for the management API
    #[arg(long, env = "GATECTL_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GATECTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "GATECTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GATECTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// How edits are written back (overrides profile)
    #[arg(long, global = true)]
    pub write_mode: Option<WriteModeArg>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WriteModeArg {
    /// Every edit replaces the whole document
    Document,
    /// Listener creation and target edits use their dedicated endpoints
    Endpoints,
}

impl From<WriteModeArg> for WriteMode {
    fn from(arg: WriteModeArg) -> Self {
        match arg {
            WriteModeArg::Document => Self::Document,
            WriteModeArg::Endpoints => Self::Endpoints,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, validate, or replace the whole config document
    #[command(alias = "doc")]
    Config(ConfigArgs),

    /// View port bindings
    Binds(BindsArgs),

    /// Manage listeners
    #[command(alias = "ls")]
    Listeners(ListenersArgs),

    /// Manage HTTP and TCP routes
    #[command(alias = "rt")]
    Routes(RoutesArgs),

    /// Manage route backends
    #[command(alias = "be")]
    Backends(BackendsArgs),

    /// Manage route policies
    #[command(alias = "pol")]
    Policies(PoliciesArgs),

    /// Manage MCP and A2A targets
    #[command(alias = "tg")]
    Targets(TargetsArgs),

    /// Show whether the gateway serves an editable local config
    Mode,

    /// Manage CLI profiles
    Profile(ProfileArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared addressing ────────────────────────────────────────────────

/// Listener address: bind port plus listener name.
#[derive(Debug, Args)]
pub struct ListenerAddr {
    /// Bind port
    #[arg(long, short = 'P')]
    pub port: u16,

    /// Listener name
    #[arg(long, short = 'l')]
    pub listener: String,
}

/// Route address: listener plus position (`2`, `#2`) or id.
#[derive(Debug, Args)]
pub struct RouteAddr {
    #[command(flatten)]
    pub listener: ListenerAddr,

    /// Route position in its array, or route id
    #[arg(value_name = "ROUTE")]
    pub route: RouteRef,

    /// Address the listener's TCP routes
    #[arg(long)]
    pub tcp: bool,
}

/// Payload given inline as JSON or read from a file.
#[derive(Debug, Args)]
pub struct JsonInput {
    /// Inline JSON value
    #[arg(long, conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read the JSON value from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG DOCUMENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the live config document
    Show,

    /// Save the live config document to a file
    Download {
        /// Destination file (stdout if omitted)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Replace the live document with a file's contents
    Apply {
        /// JSON document to apply
        file: PathBuf,
    },

    /// Validate a document file without contacting the gateway
    Validate {
        /// JSON document to validate
        file: PathBuf,
    },

    /// Check an edited copy of the live document, optionally committing it
    EditCheck {
        /// Edited JSON document
        file: PathBuf,

        /// Commit the document if it is valid
        #[arg(long)]
        commit: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BINDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BindsArgs {
    #[command(subcommand)]
    pub command: BindsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BindsCommand {
    /// List port bindings
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LISTENERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ListenersArgs {
    #[command(subcommand)]
    pub command: ListenersCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    Http,
    Https,
    Tls,
    Tcp,
    Hbone,
    Mcp,
    A2a,
}

#[derive(Debug, Subcommand)]
pub enum ListenersCommand {
    /// List listeners across all binds
    #[command(alias = "ls")]
    List {
        /// Only listeners on this port
        #[arg(long, short = 'P')]
        port: Option<u16>,
    },

    /// Add a listener, creating its bind if needed
    Add {
        /// Bind port
        #[arg(long, short = 'P')]
        port: u16,

        /// Listener name
        name: String,

        /// Listener protocol
        #[arg(long, default_value = "http")]
        protocol: ProtocolArg,

        /// Hostname the listener answers for
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Change a listener's name, protocol, or hostname
    Update {
        /// Bind port
        #[arg(long, short = 'P')]
        port: u16,

        /// Current listener name
        name: String,

        /// New name
        #[arg(long)]
        rename: Option<String>,

        /// New protocol
        #[arg(long)]
        protocol: Option<ProtocolArg>,

        /// New hostname
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Remove a listener and its routes
    #[command(alias = "rm")]
    Remove {
        /// Bind port
        #[arg(long, short = 'P')]
        port: u16,

        /// Listener name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROUTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PathKindArg {
    Exact,
    Prefix,
    Regex,
}

/// Route fields shared by `add` and `update`.
#[derive(Debug, Args)]
pub struct RouteFields {
    /// Route name
    #[arg(long)]
    pub name: Option<String>,

    /// Rule name
    #[arg(long)]
    pub rule_name: Option<String>,

    /// Hostname to match (repeatable)
    #[arg(long = "hostname")]
    pub hostnames: Vec<String>,

    /// Path to match
    #[arg(long)]
    pub path: Option<String>,

    /// How `--path` is matched
    #[arg(long, default_value = "prefix")]
    pub path_kind: PathKindArg,

    /// Header matches, `name:value` pairs separated by commas
    #[arg(long, default_value = "")]
    pub headers: String,

    /// HTTP method to match (first of a comma-separated list)
    #[arg(long, default_value = "")]
    pub methods: String,

    /// Query parameter matches, `name=value` pairs separated by commas
    #[arg(long, default_value = "")]
    pub query: String,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List routes, optionally for one listener
    #[command(alias = "ls")]
    List {
        /// Only routes on this port
        #[arg(long, short = 'P')]
        port: Option<u16>,

        /// Only routes on this listener
        #[arg(long, short = 'l')]
        listener: Option<String>,
    },

    /// Show one route in full
    Get(RouteAddr),

    /// Append a route to a listener
    Add {
        #[command(flatten)]
        at: ListenerAddr,

        /// Add a TCP route (TCP/TLS listeners)
        #[arg(long)]
        tcp: bool,

        #[command(flatten)]
        fields: RouteFields,
    },

    /// Replace a route's name, hostnames, and matches
    Update {
        #[command(flatten)]
        at: RouteAddr,

        #[command(flatten)]
        fields: RouteFields,
    },

    /// Delete a route
    #[command(alias = "rm")]
    Delete(RouteAddr),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BACKENDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BackendsArgs {
    #[command(subcommand)]
    pub command: BackendsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendKindArg {
    Mcp,
    Host,
    Service,
    Ai,
    Dynamic,
}

/// Backend payload shared by `add` and `update`.
#[derive(Debug, Args)]
pub struct BackendFields {
    /// Backend type
    #[arg(long = "type", short = 't')]
    pub kind: BackendKindArg,

    /// Backend payload: JSON, or a bare string such as `host:port`
    #[arg(long, default_value = "{}")]
    pub value: String,

    /// Load-balancing weight
    #[arg(long)]
    pub weight: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum BackendsCommand {
    /// List a route's backends
    #[command(alias = "ls")]
    List(RouteAddr),

    /// Append a backend to a route
    Add {
        #[command(flatten)]
        at: RouteAddr,

        #[command(flatten)]
        fields: BackendFields,
    },

    /// Replace the backend at an index
    Update {
        #[command(flatten)]
        at: RouteAddr,

        /// Backend index
        #[arg(long)]
        index: usize,

        #[command(flatten)]
        fields: BackendFields,
    },

    /// Remove the backend at an index
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        at: RouteAddr,

        /// Backend index
        #[arg(long)]
        index: usize,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POLICIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoliciesCommand {
    /// List policy kinds
    Kinds {
        /// Only kinds that apply to TCP routes
        #[arg(long)]
        tcp: bool,
    },

    /// Print the starting value for a policy kind
    Default {
        /// Policy kind (e.g. cors, localRateLimit)
        kind: String,
    },

    /// Show a route's policies
    Show(RouteAddr),

    /// Set one policy on a route
    Set {
        #[command(flatten)]
        at: RouteAddr,

        /// Policy kind
        #[arg(long)]
        kind: String,

        /// Policy value (defaults to the kind's starting value)
        #[command(flatten)]
        input: JsonInput,
    },

    /// Remove one policy from a route
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        at: RouteAddr,

        /// Policy kind
        #[arg(long)]
        kind: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TARGETS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TargetsArgs {
    #[command(subcommand)]
    pub command: TargetsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetKindArg {
    Sse,
    Stdio,
    Openapi,
    A2a,
    Mcp,
}

impl From<TargetKindArg> for TargetKind {
    fn from(arg: TargetKindArg) -> Self {
        match arg {
            TargetKindArg::Sse => Self::Sse,
            TargetKindArg::Stdio => Self::Stdio,
            TargetKindArg::Openapi => Self::Openapi,
            TargetKindArg::A2a => Self::A2a,
            TargetKindArg::Mcp => Self::Mcp,
        }
    }
}

/// Target fields shared by `add` and `update`.
#[derive(Debug, Args)]
pub struct TargetFields {
    /// Target name
    pub name: String,

    /// Target type
    #[arg(long = "type", short = 't')]
    pub kind: TargetKindArg,

    /// Attach only to these listeners (repeatable; default: all)
    #[arg(long = "listener", short = 'l')]
    pub listeners: Vec<String>,

    /// Type-specific payload
    #[command(flatten)]
    pub spec: JsonInput,
}

#[derive(Debug, Subcommand)]
pub enum TargetsCommand {
    /// List targets
    #[command(alias = "ls")]
    List {
        /// Only targets attached to this listener
        #[arg(long, short = 'l')]
        listener: Option<String>,
    },

    /// Show one target in full
    Get {
        /// Target name
        name: String,
    },

    /// Create a target
    Add(TargetFields),

    /// Replace an existing target
    Update(TargetFields),

    /// Delete a target
    #[command(alias = "rm")]
    Remove {
        /// Target name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROFILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List configured profiles
    #[command(alias = "ls")]
    List,

    /// Display the config file with secrets masked
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: url, token, token_env, ca_cert, insecure, timeout, write_mode
        key: String,

        /// Value to set
        value: String,

        /// Store `token` in the system keyring instead of the file
        #[arg(long)]
        keyring: bool,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
