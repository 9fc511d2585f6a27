//! Global settings
//!
//! The `settings` section of a configuration source:
//!
//! ```yaml
//! settings:
//!   data-dir: ./data
//!   skip: ["*.bak", "drafts"]
//!   recursive: true
//!   follow-links: false
//!   match-files: first
//! ```
//!
//! Later sources update earlier ones: `skip` patterns accumulate, the known
//! flags are replaced, and any other entry is merged with the value merger.
//! `data-dir` is only honoured when a configuration is first loaded.

use crate::patterns::PatternSet;
use pandocomatic_core::{Mapping, Value, extend_value};
use serde::Serialize;

/// Name of the configuration file looked up in source directories
pub const CONFIG_FILE_NAME: &str = "pandocomatic.yaml";

/// Key of the data directory setting
pub const DATA_DIR_KEY: &str = "data-dir";

/// Which templates apply when several match a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchFiles {
    /// Only the first matching template, in registration order
    First,
    /// Every matching template
    All,
}

impl MatchFiles {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "first" => Some(Self::First),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Global settings of a configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    skip: PatternSet,
    recursive: bool,
    follow_links: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_files: Option<MatchFiles>,
    /// Settings without a dedicated meaning to the engine
    #[serde(flatten)]
    other: Mapping,
}

impl Default for Settings {
    /// Hidden files and configuration files are always skipped
    fn default() -> Self {
        Self {
            skip: PatternSet::new([".*", CONFIG_FILE_NAME]),
            recursive: true,
            follow_links: false,
            match_files: Some(MatchFiles::First),
            other: Mapping::new(),
        }
    }
}

impl Settings {
    /// Patterns of files never converted
    pub fn skip(&self) -> &PatternSet {
        &self.skip
    }

    /// Convert subdirectories too
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Follow symbolic links while walking directories
    pub fn follow_links(&self) -> bool {
        self.follow_links
    }

    /// The template matching policy, `None` when a source unset it
    pub fn match_files(&self) -> Option<MatchFiles> {
        self.match_files
    }

    /// Look up a setting the engine has no dedicated field for
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }

    /// Apply the `settings` section of another configuration source
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn update(&mut self, settings: Mapping) {
        for (key, value) in settings {
            match key.as_str() {
                "skip" => self.skip.extend(value.string_items()),
                DATA_DIR_KEY => {
                    tracing::trace!("Ignoring data-dir outside of initial load");
                }
                "recursive" => self.recursive = flag(&key, &value, self.recursive),
                "follow-links" | "follow_links" => {
                    self.follow_links = flag(&key, &value, self.follow_links);
                }
                "match-files" => {
                    if value.is_null() {
                        self.match_files = None;
                    } else if let Some(policy) = value.as_str().and_then(MatchFiles::parse) {
                        self.match_files = Some(policy);
                    } else {
                        tracing::warn!(
                            "Ignoring invalid match-files setting {:?}, expected 'first' or 'all'",
                            value
                        );
                    }
                }
                _ => {
                    let previous = self.other.get(&key).cloned();
                    match extend_value(Some(value), previous) {
                        Some(merged) => {
                            self.other.insert(key, merged);
                        }
                        None => {
                            self.other.shift_remove(&key);
                        }
                    }
                }
            }
        }
    }
}

/// Read a boolean setting; `null` unsets it, anything else non-boolean is ignored
fn flag(key: &str, value: &Value, current: bool) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        other => {
            tracing::warn!(
                "Ignoring invalid {} setting {:?}, expected a boolean",
                key,
                other
            );
            current
        }
    }
}
