//! Core types and utilities for pandocomatic
//!
//! This is the foundation crate that the configuration engine and the CLI
//! depend on. It provides:
//! - The tagged configuration [`Value`] shared by YAML and TOML sources
//! - The value merger used for layered settings and template inheritance
//! - Executable lookup on the platform search path
//! - Lexical path normalisation
//! - Base error types
//!
//! This crate has no dependencies on other pandocomatic crates.

pub mod error;
pub mod merge;
pub mod path;
pub mod platform;
pub mod value;

pub use error::{Error, Result};
pub use merge::{SequenceDelta, extend_value};
pub use value::{Mapping, Value};
