use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use depfence_core::config::DEFAULT_SELECTOR;

#[derive(Parser, Debug, Clone)]
#[command(name = "depfence", version, about = "Enforce dependency policies between package groups")]
pub struct Cli {
    /// Log verbosity on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Work with dependency policies.
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Inspect dependencies.
    Deps {
        #[command(subcommand)]
        command: DepsCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PolicyCommand {
    /// Check every selected package against the policy.
    Enforce(EnforceArgs),

    /// Print the canonical form of a policy.
    Show(ShowArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum DepsCommand {
    /// Write the component dependency graph in DOT format.
    Graph(GraphArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EnforceArgs {
    /// Policy file (JSON).
    #[arg(long)]
    pub policy: PathBuf,

    /// Package selector passed to `go list`.
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Worker threads (default: available parallelism).
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Print a JSON report on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Policy file (JSON).
    #[arg(long)]
    pub policy: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Policy file (JSON).
    #[arg(long)]
    pub policy: PathBuf,

    /// Maximum dependency depth, 0 for unbounded.
    #[arg(long, default_value_t = 0)]
    pub maxdepth: usize,

    /// Comma-separated component labels to leave out.
    #[arg(long, default_value = "")]
    pub skip: String,

    /// Package selector passed to `go list`.
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Output file (default: stdout).
    pub outfile: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
}
