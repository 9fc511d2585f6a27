//! Error types for CLI commands

use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Configuration could not be loaded or applied
    #[error(transparent)]
    Configuration(#[from] pandocomatic_core::Error),

    /// No template with the requested name
    #[error("Template '{0}' does not exist")]
    TemplateNotFound(String),

    /// Output could not be rendered as YAML
    #[error("Failed to render YAML: {0}")]
    Render(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CommandError>;
