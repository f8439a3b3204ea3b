//! Clap derive structures for the `lumenkeep` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lumenkeep -- keep smart-home accessories in step with the lights on your network
#[derive(Debug, Parser)]
#[command(
    name = "lumenkeep",
    version,
    about = "Reconcile discovered smart lights with registered accessories",
    long_about = "Discovers smart lights on the local network and reconciles them with\n\
        the accessories registered by previous runs: new lights are registered,\n\
        moved lights are followed to their new address, and lights that stay\n\
        missing are pruned according to the retention settings.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "LUMENKEEP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Accessory state file (overrides `registry.path`)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

// ── Output & Log Enums ───────────────────────────────────────────────

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
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one discovery and reconciliation pass (one restart)
    Run(RunArgs),

    /// Inspect registered accessories
    #[command(alias = "acc", alias = "a")]
    Accessories(AccessoriesArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON file listing the devices currently answering discovery
    #[arg(long, short = 'd', value_name = "SNAPSHOT")]
    pub devices: PathBuf,

    /// Reconcile and report without saving the accessory state
    #[arg(long)]
    pub dry_run: bool,
}

// ── Accessories ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AccessoriesArgs {
    #[command(subcommand)]
    pub command: AccessoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccessoriesCommand {
    /// List registered accessories
    #[command(alias = "ls")]
    List,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
