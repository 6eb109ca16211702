use token_sync::cli::{Cli, Commands, SyncArgs};
use token_sync::commands::resolve::{ResolveOptions, resolve};
use token_sync::commands::sync::{SyncKind, run_sync};
use token_sync::commands::{providers, sets};
use token_sync::error::AppError;
use token_sync::host::{PromptOptions, TerminalHost};
use token_sync::logger::initialize as LoggerInitialize;

use sync_core::config::{AppConfig, default_config_dir, load_env};
use sync_core::storage::DefaultAdapterFactory;

use std::fs::create_dir_all;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.error_code().unwrap_or_else(|| e.to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };

    // Ensure log directory exists
    let log_dir = config_dir.join("logs");
    create_dir_all(&log_dir)
        .map_err(|e| AppError::app(format!("Failed to create log directory: {e}")))?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, cli.verbose)?;

    info!("token-sync {} starting", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", config_dir.display());

    load_env(&config_dir);
    let config = AppConfig::load(&config_dir)?;

    match cli.command {
        Commands::Resolve {
            document,
            theme,
            exclude_sources,
        } => {
            let theme = theme.or_else(|| config.tokens.active_theme.clone());
            let resolved = resolve(
                &document,
                ResolveOptions {
                    theme: theme.as_deref(),
                    exclude_sources,
                },
            )
            .await?;
            print_json(&resolved)
        }
        Commands::Sets { document } => {
            let (tree, used) = sets::sets(&document).await?;
            println!("{}", sets::render(&tree, &used));
            Ok(())
        }
        Commands::Providers => {
            println!("{}", providers::providers(&config_dir)?);
            Ok(())
        }
        Commands::Pull(args) => sync(SyncKind::Pull, args, &config_dir, &config).await,
        Commands::Push(args) => sync(SyncKind::Push, args, &config_dir, &config).await,
        Commands::Restore(args) => sync(SyncKind::Restore, args, &config_dir, &config).await,
    }
}

async fn sync(
    kind: SyncKind,
    args: SyncArgs,
    config_dir: &Path,
    config: &AppConfig,
) -> Result<(), AppError> {
    let host = Arc::new(TerminalHost::stdio(PromptOptions {
        assume_yes: args.yes,
        branch: args.branch,
        commit_message: args.message,
        default_commit_message: config.sync.default_commit_message.clone(),
    }));
    let factory = Arc::new(DefaultAdapterFactory::new(config.adapter_options()));

    let report = run_sync(
        kind,
        &args.provider,
        &args.document,
        config_dir,
        config,
        host,
        factory,
    )
    .await?;
    print_json(&report)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::app(format!("Failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}
