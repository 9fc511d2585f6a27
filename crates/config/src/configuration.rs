//! The pandocomatic configuration
//!
//! A [`Configuration`] combines global settings, the resolved templates and
//! an index from template name to glob patterns. It answers the questions a
//! conversion run asks per source file: skip it? convert it? with which
//! templates? to what destination?
//!
//! Configurations are layered. A run starts from one configuration file;
//! each directory may add its own `pandocomatic.yaml`, which is applied to a
//! copy with [`Configuration::reconfigure`] so sibling directories never see
//! each other's overrides.

use crate::extension::{DEFAULT_EXTENSION, extension_for_format, strip_format_extensions};
use crate::metadata::PandocMetadata;
use crate::patterns::PatternSet;
use crate::rename::{CommandRunner, RenameScript, ScriptRunner};
use crate::settings::{MatchFiles, Settings};
use crate::source::ConfigurationSource;
use crate::template::{Template, TemplateStore};
use indexmap::IndexMap;
use pandocomatic_core::path::absolute_path;
use pandocomatic_core::platform::find_executable;
use pandocomatic_core::{Error, Mapping, Result, Value};
use std::path::{Path, PathBuf};

/// Settings, templates and the derived convert-pattern index
#[derive(Debug, Clone)]
pub struct Configuration {
    data_dir: PathBuf,
    settings: Settings,
    templates: TemplateStore,
    /// Glob patterns of every template with a non-empty `glob`
    convert_patterns: IndexMap<String, PatternSet>,
}

impl Configuration {
    /// An empty configuration with default settings and no templates
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings: Settings::default(),
            templates: TemplateStore::new(),
            convert_patterns: IndexMap::new(),
        }
    }

    /// Load a configuration file
    ///
    /// The file's `data-dir` setting, if any, replaces `data_dir`. A value
    /// starting with `.` is relative to the file's directory.
    #[tracing::instrument(skip(data_dir), fields(path = %path.display()))]
    pub fn load(path: &Path, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let source = ConfigurationSource::from_file(path)?;

        let data_dir = match source.data_dir() {
            Some(dir) if dir.starts_with('.') => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                let joined = base.join(dir.strip_prefix("./").unwrap_or(dir));
                absolute_path(&joined).map_err(|e| Error::configuration_load(path, e))?
            }
            Some(dir) => PathBuf::from(dir),
            None => data_dir.into(),
        };
        tracing::debug!("Using data directory {}", data_dir.display());

        let mut configuration = Self::new(data_dir);
        configuration
            .configure(source)
            .map_err(|e| Error::configuration_load(path, e))?;
        Ok(configuration)
    }

    /// Apply another configuration layer to this configuration
    ///
    /// Nothing changes when the layer's templates extend each other in a
    /// cycle.
    pub fn configure(&mut self, source: ConfigurationSource) -> Result<()> {
        let registered = self.templates.register_all(&source.templates)?;

        if let Some(settings) = source.settings {
            self.settings.update(settings);
        }

        for name in &registered {
            self.update_convert_patterns(name);
        }

        Ok(())
    }

    /// A copy of this configuration with the file at `path` applied on top
    ///
    /// `self` is left untouched.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub fn reconfigure(&self, path: &Path) -> Result<Self> {
        let source = ConfigurationSource::from_file(path)?;
        self.with_source(source)
            .map_err(|e| Error::configuration_load(path, e))
    }

    /// A copy of this configuration with `source` applied on top
    pub fn with_source(&self, source: ConfigurationSource) -> Result<Self> {
        let mut configuration = self.clone();
        configuration.configure(source)?;
        Ok(configuration)
    }

    fn update_convert_patterns(&mut self, name: &str) {
        let globs = self
            .templates
            .get(name)
            .map(Template::globs)
            .unwrap_or_default();

        if globs.is_empty() {
            self.convert_patterns.shift_remove(name);
        } else {
            self.convert_patterns
                .insert(name.to_string(), PatternSet::new(globs));
        }
    }

    /// Base directory for relative resource paths
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The effective global settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The resolved templates
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Merge `current` over `parent` with the layering rules of configurations
    pub fn extend_value(current: Option<Value>, parent: Option<Value>) -> Option<Value> {
        pandocomatic_core::extend_value(current, parent)
    }

    /// Should `src` be left alone?
    pub fn skip(&self, src: &Path) -> bool {
        self.settings.skip().matches_path(src)
    }

    /// Does any template apply to `src`?
    ///
    /// Skipped files are never converted.
    pub fn convert(&self, src: &Path) -> bool {
        !self.skip(src)
            && self
                .convert_patterns
                .values()
                .any(|patterns| patterns.matches_path(src))
    }

    /// Should directories be converted recursively?
    pub fn recursive(&self) -> bool {
        self.settings.recursive()
    }

    /// Should symbolic links be followed?
    pub fn follow_links(&self) -> bool {
        self.settings.follow_links()
    }

    /// Convert with every matching template?
    pub fn match_all_templates(&self) -> bool {
        self.settings.match_files() == Some(MatchFiles::All)
    }

    /// Convert with the first matching template only?
    pub fn match_first_template(&self) -> bool {
        self.settings.match_files() == Some(MatchFiles::First)
    }

    fn matching_templates<'s>(&'s self, src: &Path) -> impl Iterator<Item = &'s str> {
        let skipped = self.skip(src);
        self.templates.names().filter(move |name| {
            !skipped
                && self
                    .convert_patterns
                    .get(*name)
                    .is_some_and(|patterns| patterns.matches_path(src))
        })
    }

    /// The first template whose glob matches `src`, whatever the policy
    ///
    /// `None` when `src` is skipped.
    pub fn determine_template(&self, src: &Path) -> Option<&str> {
        self.matching_templates(src).next()
    }

    /// The templates to convert `src` with, in registration order
    ///
    /// All matching templates when `match-files` is `all`, otherwise only
    /// the first. A skipped file has none.
    pub fn determine_templates(&self, src: &Path) -> Vec<&str> {
        let matches = self.matching_templates(src);
        if self.match_all_templates() {
            matches.collect()
        } else {
            matches.take(1).collect()
        }
    }

    /// Is there a template named `name`?
    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    /// The resolved template named `name`
    pub fn get_template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Template names in registration order
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.names()
    }

    fn template_pandoc(&self, template_name: Option<&str>) -> Option<&Mapping> {
        template_name
            .and_then(|name| self.templates.get(name))
            .and_then(Template::pandoc)
    }

    /// The extension of the converted file
    ///
    /// The document's own `pandoc` directive comes first, then the
    /// template's `pandoc` block. Either may set `use-extension`, used
    /// verbatim, or `to`, whose format is mapped to its conventional
    /// extension. Defaults to `html`.
    pub fn find_extension(
        &self,
        dst: &Path,
        template_name: Option<&str>,
        metadata: &PandocMetadata,
    ) -> String {
        let extension = metadata
            .pandoc_options()
            .and_then(extension_in)
            .or_else(|| self.template_pandoc(template_name).and_then(extension_in))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        tracing::trace!("Extension for {} is '{}'", dst.display(), extension);
        extension
    }

    /// `dst` with its extension replaced by [`Configuration::find_extension`]
    pub fn set_extension(
        &self,
        dst: &Path,
        template_name: Option<&str>,
        metadata: &PandocMetadata,
    ) -> PathBuf {
        dst.with_extension(self.find_extension(dst, template_name, metadata))
    }

    /// Where converting to `dst` should write its output
    ///
    /// An `output` in the document's `pandoc` directive wins over one in the
    /// template; a relative output is placed next to `dst`. Without either,
    /// `dst` gets the extension of the output format and is passed through
    /// the `rename` script, if one is configured.
    pub fn set_destination(
        &self,
        dst: &Path,
        template_name: Option<&str>,
        metadata: &PandocMetadata,
    ) -> PathBuf {
        self.set_destination_with(dst, template_name, metadata, &CommandRunner)
    }

    /// [`Configuration::set_destination`] with a custom script runner
    pub fn set_destination_with(
        &self,
        dst: &Path,
        template_name: Option<&str>,
        metadata: &PandocMetadata,
        runner: &dyn ScriptRunner,
    ) -> PathBuf {
        let mut destination = None;
        let mut rename_script = None;

        if let Some(pandoc) = metadata.pandoc_options() {
            destination = output_in(pandoc, dst);
            rename_script = pandoc.get("rename").and_then(Value::as_str);
        }

        if destination.is_none()
            && let Some(pandoc) = self.template_pandoc(template_name)
        {
            destination = output_in(pandoc, dst);
            rename_script = rename_script.or_else(|| pandoc.get("rename").and_then(Value::as_str));
        }

        if let Some(destination) = destination {
            return destination;
        }

        let destination = self.set_extension(dst, template_name, metadata);
        match rename_script {
            Some(script) => self.rename_destination(script, &destination, runner),
            None => destination,
        }
    }

    /// Run a rename script, keeping `destination` when that fails
    fn rename_destination(
        &self,
        script: &str,
        destination: &Path,
        runner: &dyn ScriptRunner,
    ) -> PathBuf {
        let renamed = RenameScript::resolve(script, destination, |command| {
            self.update_path(command, false)
        })
        .and_then(|script| script.run(runner, destination));

        match renamed {
            Ok(renamed) => renamed,
            Err(e) => {
                tracing::warn!("{}. Keeping destination {}", e, destination.display());
                destination.to_path_buf()
            }
        }
    }

    /// Resolve a path named in a configuration
    ///
    /// - `./file` is relative to wherever the caller works and loses its `./`
    /// - absolute paths are kept
    /// - anything else lives in the data directory, unless `check_executable`
    ///   is set and the executable search path has it
    pub fn update_path(&self, path: &str, check_executable: bool) -> PathBuf {
        if let Some(local) = path.strip_prefix("./") {
            return PathBuf::from(local);
        }

        if Path::new(path).is_absolute() {
            return PathBuf::from(path);
        }

        if check_executable && let Some(executable) = find_executable(path) {
            return executable;
        }

        self.data_dir.join(path)
    }
}

/// Extension named by a `pandoc` block, if any
fn extension_in(pandoc: &Mapping) -> Option<String> {
    if let Some(extension) = pandoc.get("use-extension").and_then(Value::as_str) {
        return Some(extension.to_string());
    }

    pandoc
        .get("to")
        .and_then(Value::as_str)
        .map(|to| extension_for_format(strip_format_extensions(to)).to_string())
}

/// The `output` of a `pandoc` block, relative to the directory of `dst`
fn output_in(pandoc: &Mapping, dst: &Path) -> Option<PathBuf> {
    let output = Path::new(pandoc.get("output")?.as_str()?);
    if output.is_absolute() {
        Some(output.to_path_buf())
    } else {
        Some(dst.parent().unwrap_or_else(|| Path::new("")).join(output))
    }
}
