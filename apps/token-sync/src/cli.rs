//! Command line definitions.

use sync_core::config::CONFIG_DIR_ENV;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const DEFAULT_DOCUMENT: &str = "tokens.json";

/// Resolve design tokens and sync them with remote storage
#[derive(Debug, Parser)]
#[command(name = "token-sync")]
#[command(version)]
#[command(about = "Resolve design tokens and sync them with remote storage", long_about = None)]
pub struct Cli {
    /// Directory holding config.json, providers.toml and .env
    #[arg(long, global = true, env = CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    /// Log debug output to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    // ============================================
    // Local Commands
    // ============================================
    /// Resolve every token and print the result as JSON
    Resolve {
        /// Token document file
        #[arg(short, long, default_value = DEFAULT_DOCUMENT)]
        document: PathBuf,

        /// Theme id or name (defaults to the configured active theme)
        #[arg(short, long)]
        theme: Option<String>,

        /// Drop tokens that only come from source sets
        #[arg(long)]
        exclude_sources: bool,
    },

    /// Show token sets as a folder tree with their status
    Sets {
        /// Token document file
        #[arg(short, long, default_value = DEFAULT_DOCUMENT)]
        document: PathBuf,
    },

    /// List configured remote storages
    Providers,

    // ============================================
    // Sync Commands
    // ============================================
    /// Pull tokens from a remote storage
    Pull(SyncArgs),

    /// Push local tokens to a remote storage
    Push(SyncArgs),

    /// Pull from a remote, seeding it from local tokens when it is empty
    Restore(SyncArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Storage internal id or name from providers.toml
    #[arg(short, long)]
    pub provider: String,

    /// Token document file
    #[arg(short, long, default_value = DEFAULT_DOCUMENT)]
    pub document: PathBuf,

    /// Answer yes to the overwrite prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Branch to push to, skipping the prompt
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Commit message, skipping the prompt
    #[arg(short, long)]
    pub message: Option<String>,
}
