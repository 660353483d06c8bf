//! KorQA CLI
//!
//! Main entry point for the korqa command-line tool.
//! Loads KorQuAD passages into a local index and answers Korean questions
//! with retrieval quality gates and answer validation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, CleanCommand, LoadCommand, StatusCommand, ValidateCommand};
use korqa_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppResult,
};
use std::path::PathBuf;

/// KorQA - Korean question answering over KorQuAD with answer validation
#[derive(Parser, Debug)]
#[command(name = "korqa")]
#[command(about = "Korean question answering over KorQuAD with answer validation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "KORQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "KORQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama)
    #[arg(short, long, global = true, env = "KORQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "KORQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a KorQuAD corpus into the passage index
    Load(LoadCommand),

    /// Answer a question from the knowledge base
    Ask(AskCommand),

    /// Score an answer against a context
    Validate(ValidateCommand),

    /// Show knowledge base status
    Status(StatusCommand),

    /// Remove every passage from a knowledge base
    Clean(CleanCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(path) = cli.config.as_ref().filter(|p| config.config_file.as_ref() != Some(*p)) {
        config = config.merge_yaml(path)?;
    }

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(
        config.log_level.as_deref(),
        LogFormat::parse(&config.log_format),
        config.no_color,
    )?;

    tracing::info!("KorQA CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Load(_) => "load",
        Commands::Ask(_) => "ask",
        Commands::Validate(_) => "validate",
        Commands::Status(_) => "status",
        Commands::Clean(_) => "clean",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Load(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Validate(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
