//! Pandocomatic CLI library
//!
//! Inspect how a pandocomatic configuration resolves: which templates
//! exist after inheritance, which settings are in effect, and what would
//! happen to given source files.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use command::Command;
use common::RuntimeContext;

/// Pandocomatic - automate the use of pandoc
#[derive(Parser)]
#[command(name = "pandocomatic")]
#[command(about = "Inspect pandocomatic configurations and templates")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: ./pandocomatic.yaml when present)
    #[arg(short, long, env = "PANDOCOMATIC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory for relative processor and script paths
    #[arg(short, long, env = "PANDOCOMATIC_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "PANDOCOMATIC_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the pandocomatic CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect resolved templates
    #[command(subcommand)]
    Templates(TemplatesCommands),

    /// Show the effective settings
    Settings(cmd::settings::SettingsCommand),

    /// Show how source files would be converted
    Plan(cmd::plan::PlanCommand),
}

/// Commands for inspecting templates
#[derive(Subcommand)]
pub enum TemplatesCommands {
    /// List resolved templates with their glob patterns
    List(cmd::templates::ListCommand),

    /// Show a resolved template as YAML
    Show(cmd::templates::ShowCommand),
}

/// Execute the command based on the command type
fn execute_command(command: &Commands, context: &RuntimeContext) -> Result<()> {
    match command {
        Commands::Templates(TemplatesCommands::List(list_cmd)) => list_cmd.execute(context)?,
        Commands::Templates(TemplatesCommands::Show(show_cmd)) => show_cmd.execute(context)?,
        Commands::Settings(settings_cmd) => settings_cmd.execute(context)?,
        Commands::Plan(plan_cmd) => {
            plan_cmd.execute(context)?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI logic
///
/// # Errors
///
/// Returns an error if:
/// - Logging initialization fails
/// - Configuration loading fails
/// - Command execution fails
pub fn run(cli: Cli) -> Result<()> {
    pandocomatic_config::logging::init(cli.verbose, cli.log_file.as_deref())?;

    let context = RuntimeContext::load(cli.config.as_deref(), cli.data_dir.as_deref())?;

    execute_command(&cli.command, &context)
}
