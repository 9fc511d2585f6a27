//! Configuration sources
//!
//! A configuration source is a document with two optional sections:
//!
//! ```yaml
//! settings:
//!   data-dir: ./data
//!   skip: ["*.bak"]
//! templates:
//!   web:
//!     glob: ["*.md"]
//!     pandoc:
//!       to: html5
//! ```
//!
//! Sources are YAML, except files ending in `.toml` which are read as TOML
//! with the same schema.

use crate::settings::DATA_DIR_KEY;
use crate::template::TemplateDefinition;
use indexmap::IndexMap;
use pandocomatic_core::{Error, Mapping, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A parsed configuration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSource {
    /// The `settings` section, if present
    pub settings: Option<Mapping>,

    /// The `templates` section, in declaration order
    pub templates: IndexMap<String, TemplateDefinition>,
}

/// On-disk shape; unknown top-level keys are ignored
#[derive(Deserialize)]
struct RawSource {
    #[serde(default)]
    settings: Option<Mapping>,
    #[serde(default)]
    templates: Option<IndexMap<String, Option<TemplateDefinition>>>,
}

impl From<RawSource> for ConfigurationSource {
    fn from(raw: RawSource) -> Self {
        let templates = raw
            .templates
            .unwrap_or_default()
            .into_iter()
            .map(|(name, definition)| (name, definition.unwrap_or_default()))
            .collect();

        Self {
            settings: raw.settings,
            templates,
        }
    }
}

impl ConfigurationSource {
    /// Read a configuration file
    ///
    /// Failures are reported as [`Error::ConfigurationLoad`] naming the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::configuration_load(path, e))?;

        let source = if is_toml(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };

        source.map_err(|e| Error::configuration_load(path, e))
    }

    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if is_blank(content) {
            return Ok(Self::default());
        }

        serde_yaml::from_str::<RawSource>(content)
            .map(Self::from)
            .map_err(|e| Error::InvalidSource(format!("Failed to parse YAML: {e}")))
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<RawSource>(content)
            .map(Self::from)
            .map_err(|e| Error::InvalidSource(format!("Failed to parse TOML: {e}")))
    }

    /// The `data-dir` setting, if it is a string
    pub fn data_dir(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|settings| settings.get(DATA_DIR_KEY))
            .and_then(|value| value.as_str())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Whitespace, comments and document markers only
fn is_blank(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}
