//! CLI command implementations

pub mod plan;
pub mod settings;
pub mod templates;
