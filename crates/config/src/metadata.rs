//! Per-document directives
//!
//! A source document can steer its own conversion from its metadata block:
//!
//! ```yaml
//! ---
//! title: Report
//! pandocomatic_:
//!   use-template: web
//!   pandoc:
//!     to: html5
//!     output: out/report.html
//!     rename: ./rename.sh
//! ---
//! ```
//!
//! Both `pandocomatic_` and `pandocomatic` are recognised; the former wins
//! when a document has both.

use pandocomatic_core::{Error, Mapping, Result, Value};
use std::path::Path;

/// Preferred key of the directive block
pub const PANDOCOMATIC_KEY: &str = "pandocomatic_";

/// Alternative key of the directive block
pub const PANDOCOMATIC_ALIAS: &str = "pandocomatic";

/// The metadata of a source document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PandocMetadata {
    fields: Mapping,
}

impl PandocMetadata {
    /// Wrap already parsed metadata
    pub fn new(fields: Mapping) -> Self {
        Self { fields }
    }

    /// Metadata without any fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extract the metadata block at the start of a document
    ///
    /// The block opens with a `---` line and closes with `---` or `...`.
    /// A document without such a block has empty metadata.
    pub fn from_front_matter(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        if lines.next().map(str::trim_end) != Some("---") {
            return Ok(Self::empty());
        }

        let mut block = Vec::new();
        let mut closed = false;
        for line in lines {
            let marker = line.trim_end();
            if marker == "---" || marker == "..." {
                closed = true;
                break;
            }
            block.push(line);
        }

        if !closed {
            tracing::debug!("Metadata block is not closed, ignoring it");
            return Ok(Self::empty());
        }

        let value: Value = serde_yaml::from_str(&block.join("\n"))
            .map_err(|e| Error::InvalidSource(format!("Failed to parse metadata block: {e}")))?;

        match value {
            Value::Mapping(fields) => Ok(Self::new(fields)),
            Value::Null => Ok(Self::empty()),
            other => Err(Error::InvalidSource(format!(
                "Metadata block must be a mapping, found {}",
                other.type_name()
            ))),
        }
    }

    /// Read a document and extract its leading metadata block
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_front_matter(&text)
    }

    /// A top-level metadata field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the document carries a directive block
    pub fn has_pandocomatic(&self) -> bool {
        self.pandocomatic().is_some()
    }

    /// The directive block
    pub fn pandocomatic(&self) -> Option<&Mapping> {
        self.fields
            .get(PANDOCOMATIC_KEY)
            .or_else(|| self.fields.get(PANDOCOMATIC_ALIAS))
            .and_then(Value::as_mapping)
    }

    /// The directive's `pandoc` options
    pub fn pandoc_options(&self) -> Option<&Mapping> {
        self.pandocomatic()
            .and_then(|pandocomatic| pandocomatic.get("pandoc"))
            .and_then(Value::as_mapping)
    }

    /// Templates the document asks for explicitly
    pub fn use_templates(&self) -> Vec<String> {
        self.pandocomatic()
            .and_then(|pandocomatic| pandocomatic.get("use-template"))
            .map(Value::string_items)
            .unwrap_or_default()
    }

    /// Whether the document names templates with `use-template`
    pub fn has_templates(&self) -> bool {
        !self.use_templates().is_empty()
    }
}

impl From<Mapping> for PandocMetadata {
    fn from(fields: Mapping) -> Self {
        Self::new(fields)
    }
}
