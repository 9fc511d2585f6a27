//! Glob pattern matching on file names
//!
//! Both the `skip` setting and a template's `glob` list are sets of
//! filesystem-style wildcard patterns matched against a file's base name:
//!
//! ```yaml
//! glob: ["*.md", "chapter-?.markdown", "[a-c]*.txt"]
//! ```
//!
//! `*` and `?` never match a leading `.`, so `*.md` does not select hidden
//! files; `.*` does. Matching is case sensitive except on Windows.

use glob::{MatchOptions, Pattern};
use serde::{Serialize, Serializer};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: !cfg!(windows),
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// An ordered set of compiled glob patterns
///
/// Invalid patterns are reported with a warning and left out of matching;
/// they are still listed by [`PatternSet::sources`] so configurations
/// round-trip unchanged.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    sources: Vec<String>,
    compiled: Vec<Pattern>,
}

impl PatternSet {
    /// Compile a set of patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.extend(patterns);
        set
    }

    /// Append patterns, skipping ones already in the set
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if self.sources.contains(&pattern) {
                continue;
            }

            match Pattern::new(&pattern) {
                Ok(compiled) => self.compiled.push(compiled),
                Err(e) => tracing::warn!("Ignoring invalid glob pattern '{}': {}", pattern, e),
            }
            self.sources.push(pattern);
        }
    }

    /// The patterns as written
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Whether the set has no patterns at all
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Check whether a bare file name matches any pattern
    pub fn matches(&self, file_name: &str) -> bool {
        self.compiled
            .iter()
            .any(|pattern| pattern.matches_with(file_name, MATCH_OPTIONS))
    }

    /// Check whether the base name of `path` matches any pattern
    ///
    /// Paths without a base name (such as `/` or `..`) never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.matches(&name.to_string_lossy()))
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}

impl Eq for PatternSet {}

impl Serialize for PatternSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.sources)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_star_pattern() {
        let set = PatternSet::new(["*.md"]);
        assert!(set.matches("report.md"));
        assert!(!set.matches("report.markdown"));
        assert!(!set.matches("report.md.bak"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let set = PatternSet::new(["chapter-?.md", "[a-c]*.txt"]);
        assert!(set.matches("chapter-1.md"));
        assert!(!set.matches("chapter-10.md"));
        assert!(set.matches("b-notes.txt"));
        assert!(!set.matches("d-notes.txt"));
    }

    #[test]
    fn test_star_does_not_match_hidden_files() {
        let set = PatternSet::new(["*.md"]);
        assert!(!set.matches(".draft.md"));

        let hidden = PatternSet::new([".*"]);
        assert!(hidden.matches(".git"));
        assert!(hidden.matches(".draft.md"));
        assert!(!hidden.matches("visible.md"));
    }

    #[test]
    fn test_matches_base_name_only() {
        let set = PatternSet::new(["*.md"]);
        assert!(set.matches_path(Path::new("/docs/nested/report.md")));
        assert!(!set.matches_path(Path::new("/docs/report.md/index.html")));

        let dir_pattern = PatternSet::new(["docs*"]);
        assert!(!dir_pattern.matches_path(Path::new("/docs/report.md")));
    }

    #[test]
    fn test_path_without_file_name_never_matches() {
        let set = PatternSet::new(["*"]);
        assert!(!set.matches_path(Path::new("/")));
    }

    #[test]
    fn test_extend_deduplicates() {
        let mut set = PatternSet::new([".*", "pandocomatic.yaml"]);
        set.extend(["*.bak", ".*"]);
        assert_eq!(set.sources(), [".*", "pandocomatic.yaml", "*.bak"]);
    }

    #[test]
    fn test_invalid_pattern_is_kept_but_never_matches() {
        let set = PatternSet::new(["[", "*.md"]);
        assert_eq!(set.sources().len(), 2);
        assert!(set.matches("a.md"));
        assert!(!set.matches("["));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::default();
        assert!(set.is_empty());
        assert!(!set.matches("anything"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_case_sensitive_on_unix() {
        let set = PatternSet::new(["*.md"]);
        assert!(!set.matches("README.MD"));
    }
}
