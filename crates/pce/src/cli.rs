//! Clap derive structures for the `pce` CLI.
//!
//! Defines the command tree, global flags, and shared types. Kept free of
//! workspace crates so `build.rs` can include it for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pce -- read and change Illumio PCE policy objects
#[derive(Debug, Parser)]
#[command(
    name = "pce",
    version,
    about = "Manage Illumio PCE policy objects from the command line",
    long_about = "Query, create, update and provision objects on an Illumio\n\
        Policy Compute Engine through its REST API.\n\n\
        Object kinds are addressed by name (labels, ip_lists, rule_sets, ...);\n\
        individual objects by href (/orgs/1/labels/42).",
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
    /// Config profile to use
    #[arg(long, short = 'p', env = "PCE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// PCE hostname (overrides profile)
    #[arg(long, env = "PCE_HOST", global = true)]
    pub host: Option<String>,

    /// PCE port (overrides profile)
    #[arg(long, env = "PCE_PORT", global = true)]
    pub port: Option<u16>,

    /// Organization id (overrides profile)
    #[arg(long, env = "PCE_ORG", global = true)]
    pub org: Option<u32>,

    /// API key id
    #[arg(long, env = "PCE_API_KEY_ID", global = true)]
    pub api_key_id: Option<String>,

    /// API secret
    #[arg(long, env = "PCE_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "PCE_OUTPUT", default_value = "table", global = true)]
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PCE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PCE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Plain text, one href per line (scripting)
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the PCE is reachable
    Health,

    /// List the object kinds this CLI can address
    Kinds,

    /// List objects of one kind
    #[command(alias = "ls")]
    Get(GetArgs),

    /// Show one object by href
    Show {
        /// Object href, e.g. /orgs/1/labels/42
        href: String,
    },

    /// Create an object from a JSON file
    Create(CreateArgs),

    /// Update an object from a JSON file (partial fields allowed)
    Update {
        /// Object href
        href: String,

        /// JSON file with the fields to change ("-" for stdin)
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Delete an object by href
    #[command(alias = "rm")]
    Delete {
        /// Object href
        href: String,
    },

    /// Bulk create, update or delete (workloads, virtual_services)
    Bulk(BulkArgs),

    /// Provision draft changes to active policy
    Provision(ProvisionArgs),

    /// Generate a pairing key from a pairing profile
    PairingKey {
        /// Pairing profile href
        profile: String,
    },

    /// Run an Explorer traffic query
    Traffic(TrafficArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Object commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Object kind, e.g. labels, ip_lists, rule_sets
    pub kind: String,

    /// Filter by name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Extra query parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Read the active policy copy instead of draft
    #[arg(long)]
    pub active: bool,

    /// Parent href for nested kinds (rules, container_workload_profiles)
    #[arg(long)]
    pub parent: Option<String>,

    /// Fetch every object, raising max_results to the reported total
    #[arg(long, conflicts_with = "via_job")]
    pub all: bool,

    /// Fetch through a server-side async job
    #[arg(long = "async")]
    pub via_job: bool,

    /// Upper bound on returned objects
    #[arg(long)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Object kind
    pub kind: String,

    /// JSON file with the object body ("-" for stdin)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Parent href for nested kinds
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Debug, Args)]
pub struct BulkArgs {
    #[arg(value_enum)]
    pub action: BulkAction,

    /// Object kind
    pub kind: String,

    /// JSON file holding an array of objects (or hrefs for delete)
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BulkAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Change description recorded on the policy version
    #[arg(long, short = 'm')]
    pub message: String,

    /// Draft object hrefs to provision
    #[arg(required = true)]
    pub hrefs: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TrafficArgs {
    /// Query name shown in the PCE UI
    #[arg(long, default_value = "pce-cli")]
    pub name: String,

    /// Look back this many days
    #[arg(long, default_value = "7")]
    pub days: u32,

    /// Source to include: href, IP address or CIDR (repeatable)
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Source to exclude: href, IP, FQDN or transmission (repeatable)
    #[arg(long = "exclude-source")]
    pub exclude_sources: Vec<String>,

    /// Destination to include (repeatable)
    #[arg(long = "destination")]
    pub destinations: Vec<String>,

    /// Destination to exclude (repeatable)
    #[arg(long = "exclude-destination")]
    pub exclude_destinations: Vec<String>,

    /// Policy decision filter: allowed, blocked, potentially_blocked, unknown
    #[arg(long = "decision")]
    pub decisions: Vec<String>,

    /// Upper bound on returned flows
    #[arg(long)]
    pub max_results: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration (secrets redacted)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a secret read from stdin in the system keyring
    SetSecret {
        /// Which secret to store
        #[arg(value_enum, default_value = "api-secret")]
        item: SecretItem,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretItem {
    ApiSecret,
    Password,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
