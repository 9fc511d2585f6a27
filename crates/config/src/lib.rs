//! Configuration and template resolution for pandocomatic
//!
//! This crate handles:
//! - Loading layered configuration files (YAML or TOML)
//! - Resolving templates and their `extends` chains
//! - Matching source files against skip and template glob patterns
//! - Deriving output destinations and extensions
//! - Logging initialization

pub mod configuration;
pub mod extension;
pub mod logging;
pub mod metadata;
pub mod patterns;
pub mod rename;
pub mod settings;
pub mod source;
pub mod template;

// Re-export error types from core
pub use pandocomatic_core::{Error, Mapping, Result, Value};

// Re-export main types
pub use configuration::Configuration;
pub use metadata::PandocMetadata;
pub use patterns::PatternSet;
pub use rename::{CommandRunner, ScriptRunner};
pub use settings::{CONFIG_FILE_NAME, MatchFiles, Settings};
pub use source::ConfigurationSource;
pub use template::{Template, TemplateDefinition, TemplateField, TemplateStore};
