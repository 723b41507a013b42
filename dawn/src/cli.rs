//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Task Dawn - daily digest of your most important tasks
#[derive(Parser)]
#[command(
    name = "dawn",
    about = "Ignite your day with prioritized tasks in your inbox",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/taskdawn/logs/taskdawn.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, rank, and email today's digest (default)
    Run {
        /// Print the digest instead of emailing it
        #[arg(long)]
        dry_run: bool,

        /// Send even on a rest day
        #[arg(short, long)]
        force: bool,
    },

    /// Print today's digest without sending it
    Preview,

    /// List every open task in ranked order
    List {
        /// Maximum number of tasks to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}
