//! Output format to file extension mapping
//!
//! Pandoc names output formats (`html5`, `latex`, `markdown_strict`), not
//! file extensions. When a destination path is derived from a format, the
//! conventional extension for that format is looked up here; formats not in
//! the table are used as their own extension.

/// Conventional extension for each output format that needs one
const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("native", "hs"),
    ("plain", "txt"),
    ("markdown", "md"),
    ("markdown_strict", "md"),
    ("markdown_phpextra", "md"),
    ("markdown_mmd", "md"),
    ("gfm", "md"),
    ("commonmark", "md"),
    ("html4", "html"),
    ("html5", "html"),
    ("latex", "tex"),
    ("beamer", "tex"),
    ("context", "tex"),
    ("docbook4", "docbook"),
    ("docbook5", "docbook"),
    ("opendocument", "odt"),
    ("epub2", "epub"),
    ("epub3", "epub"),
    ("asciidoc", "adoc"),
    ("slidy", "html"),
    ("slideous", "html"),
    ("dzslides", "html"),
    ("revealjs", "html"),
    ("s5", "html"),
];

/// Extension used when nothing determines one
pub const DEFAULT_EXTENSION: &str = "html";

/// Strip pandoc's `+EXTENSION` / `-EXTENSION` toggles from a format name
///
/// `markdown+smart-raw_html` becomes `markdown`.
pub fn strip_format_extensions(format: &str) -> &str {
    format
        .split(['+', '-'])
        .next()
        .unwrap_or(format)
}

/// Look up the conventional extension for `format`
///
/// Falls back to the format name itself.
pub fn extension_for_format(format: &str) -> &str {
    DEFAULT_EXTENSIONS
        .iter()
        .find(|(name, _)| *name == format)
        .map_or(format, |(_, extension)| *extension)
}
