//! Common utilities and types shared across CLI commands

use anyhow::{Context, Result};
use pandocomatic_config::{CONFIG_FILE_NAME, Configuration};
use std::path::{Path, PathBuf};

/// Shared state handed to every command
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    configuration: Configuration,
    config_path: Option<PathBuf>,
}

impl RuntimeContext {
    /// Wrap an already loaded configuration
    pub fn new(configuration: Configuration, config_path: Option<PathBuf>) -> Self {
        Self {
            configuration,
            config_path,
        }
    }

    /// Load the configuration the CLI was pointed at
    ///
    /// Without `--config`, `./pandocomatic.yaml` is used when it exists;
    /// otherwise the configuration starts empty.
    pub fn load(config: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir()?,
        };

        let config_path = config.map(Path::to_path_buf).or_else(|| {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            local.is_file().then_some(local)
        });

        let configuration = match &config_path {
            Some(path) => Configuration::load(path, &data_dir)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => {
                tracing::debug!("No configuration file, starting from defaults");
                Configuration::new(data_dir)
            }
        };

        Ok(Self::new(configuration, config_path))
    }

    /// The loaded configuration
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// The configuration file in use, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// `<platform data dir>/pandocomatic`, or the current directory
fn default_data_dir() -> Result<PathBuf> {
    match dirs::data_dir() {
        Some(dir) => Ok(dir.join("pandocomatic")),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}
