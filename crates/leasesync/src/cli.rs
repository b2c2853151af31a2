//! Clap derive structures for the `leasesync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// leasesync -- reconcile DHCP lease notifications into the lease table
#[derive(Debug, Parser)]
#[command(
    name = "leasesync",
    version,
    about = "Reconcile DHCP lease notifications into a per-device lease table",
    long_about = "Feeds raw DHCP lease notifications (one JSON object per line) through\n\
        the lease reconciliation engine and persists one row per device\n\
        into the lease table.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "LEASESYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Lease table file (overrides [store] path)
    #[arg(long, env = "LEASESYNC_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Forward raw events without coalescing per device
    #[arg(long, global = true)]
    pub no_coalesce: bool,

    /// Row selection policy (overrides [engine] match_policy)
    #[arg(long, global = true)]
    pub match_policy: Option<MatchPolicyArg>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation for destructive operations
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Shared Enums ─────────────────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MatchPolicyArg {
    /// One row per device
    Hwaddr,
    /// One row per device and address
    HwaddrInet,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a file of lease events into the lease table
    Replay(ReplayArgs),

    /// Stream lease events from stdin until EOF or Ctrl-C
    Watch(WatchArgs),

    /// Inspect or reset the lease table
    Table(TableArgs),

    /// Manage leasesync configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Replay / Watch ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON-lines event file, or '-' for stdin
    pub input: PathBuf,

    /// Skip malformed lines instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,

    /// Print every emitted notification instead of the final table
    #[arg(long)]
    pub notifications: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Also print events that produced no notification
    #[arg(long)]
    pub show_quiet: bool,
}

// ── Table ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TableArgs {
    #[command(subcommand)]
    pub command: TableCommand,
}

#[derive(Debug, Subcommand)]
pub enum TableCommand {
    /// List rows in the lease table
    #[command(alias = "ls")]
    List,

    /// Show the row for one hardware address
    Get {
        /// Hardware address (any case, ':' or '-' separated)
        hwaddr: String,
    },

    /// Remove every row from the lease table
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
