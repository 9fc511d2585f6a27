//! Base error types for pandocomatic
//!
//! This module provides the error type shared by the configuration engine
//! and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be read, parsed or applied
    #[error("Unable to load configuration file {}: {source}", path.display())]
    ConfigurationLoad {
        /// The configuration file
        path: PathBuf,
        /// What went wrong
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration document does not have the expected shape
    #[error("Invalid configuration: {0}")]
    InvalidSource(String),

    /// Templates extend each other in a cycle
    #[error("Template inheritance cycle: {}", cycle.join(" -> "))]
    TemplateCycle {
        /// Template names along the cycle, starting and ending with the same name
        cycle: Vec<String>,
    },

    /// Rename script could not be found, neither as a file nor on the search path
    #[error("Rename script does not exist: {0}")]
    ScriptNotFound(String),

    /// Rename script exists but cannot be executed
    #[error("Rename script is not executable: {}", .0.display())]
    ScriptNotExecutable(PathBuf),

    /// Rename script ran but did not produce a renamed destination
    #[error("Running rename script '{script}' on destination '{}' failed: {reason}", destination.display())]
    ScriptExecution {
        /// The script as configured
        script: String,
        /// The destination handed to the script
        destination: PathBuf,
        /// Why it failed
        reason: String,
    },
}

impl Error {
    /// Wrap any error raised while loading `path` as a configuration load error
    pub fn configuration_load<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::ConfigurationLoad {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
