//! Templates and their resolution
//!
//! A template bundles the conversion settings applied to matching source
//! files. Templates inherit from each other through `extends`:
//!
//! ```yaml
//! templates:
//!   base:
//!     pandoc:
//!       standalone: true
//!   web:
//!     extends: base
//!     glob: ["*.md"]
//!     pandoc:
//!       to: html5
//! ```
//!
//! Resolving `web` merges the resolved `base` first, then `web`'s own
//! fields on top, field by field with [`extend_value`]. Registering a name
//! that already exists (for example from a directory-local configuration)
//! merges the new definition into the stored template instead of replacing
//! it.

use indexmap::IndexMap;
use indexmap::map::Entry;
use pandocomatic_core::{Error, Mapping, Result, SequenceDelta, Value, extend_value};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// The mergeable fields of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    /// `glob`: patterns selecting the files the template applies to
    Glob,
    /// `metadata`: merged into the document's metadata
    Metadata,
    /// `setup`: commands run once before converting
    Setup,
    /// `preprocessors`: commands run on the source before pandoc
    Preprocessors,
    /// `pandoc`: pandoc options
    Pandoc,
    /// `postprocessors`: commands run on pandoc's output
    Postprocessors,
    /// `cleanup`: commands run once after converting
    Cleanup,
}

impl TemplateField {
    /// All fields, in merge order
    pub const ALL: [Self; 7] = [
        Self::Glob,
        Self::Metadata,
        Self::Setup,
        Self::Preprocessors,
        Self::Pandoc,
        Self::Postprocessors,
        Self::Cleanup,
    ];

    /// The field's key in a configuration source
    pub fn key(self) -> &'static str {
        match self {
            Self::Glob => "glob",
            Self::Metadata => "metadata",
            Self::Setup => "setup",
            Self::Preprocessors => "preprocessors",
            Self::Pandoc => "pandoc",
            Self::Postprocessors => "postprocessors",
            Self::Cleanup => "cleanup",
        }
    }

    /// The field stored under `key`, if it is one
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether the field holds a mapping rather than a sequence
    pub fn is_mapping(self) -> bool {
        matches!(self, Self::Metadata | Self::Pandoc)
    }

    /// Value a definition gets for a field it does not mention
    fn empty_value(self) -> Value {
        if self.is_mapping() {
            Value::Mapping(Mapping::new())
        } else {
            Value::Sequence(Vec::new())
        }
    }
}

/// A template as written in a configuration source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateDefinition {
    /// Names of the templates this one extends, in merge order
    #[serde(default, deserialize_with = "one_or_many")]
    pub extends: Vec<String>,

    /// Everything else, keyed as in the source
    #[serde(flatten)]
    pub fields: Mapping,
}

/// Accept `extends: base` as well as `extends: [base, web]`
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.string_items())
}

/// A fully resolved template
///
/// A field is `None` when a layer deleted it with an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    glob: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    setup: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preprocessors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pandoc: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postprocessors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleanup: Option<Value>,
}

impl Template {
    /// Build the unresolved template a definition describes
    ///
    /// Fields the definition does not mention become empty sequences or
    /// mappings; fields set to `null` stay absent.
    pub fn from_definition(definition: &TemplateDefinition) -> Self {
        let mut template = Self::default();

        for field in TemplateField::ALL {
            *template.slot_mut(field) = match definition.fields.get(field.key()) {
                Some(Value::Null) => None,
                Some(value) => Some(value.clone()),
                None => Some(field.empty_value()),
            };
        }

        for key in definition.fields.keys() {
            if TemplateField::from_key(key).is_none() {
                tracing::debug!("Ignoring unknown template field '{}'", key);
            }
        }

        template
    }

    /// A field's value, `None` when it was deleted
    pub fn get(&self, field: TemplateField) -> Option<&Value> {
        match field {
            TemplateField::Glob => self.glob.as_ref(),
            TemplateField::Metadata => self.metadata.as_ref(),
            TemplateField::Setup => self.setup.as_ref(),
            TemplateField::Preprocessors => self.preprocessors.as_ref(),
            TemplateField::Pandoc => self.pandoc.as_ref(),
            TemplateField::Postprocessors => self.postprocessors.as_ref(),
            TemplateField::Cleanup => self.cleanup.as_ref(),
        }
    }

    fn slot_mut(&mut self, field: TemplateField) -> &mut Option<Value> {
        match field {
            TemplateField::Glob => &mut self.glob,
            TemplateField::Metadata => &mut self.metadata,
            TemplateField::Setup => &mut self.setup,
            TemplateField::Preprocessors => &mut self.preprocessors,
            TemplateField::Pandoc => &mut self.pandoc,
            TemplateField::Postprocessors => &mut self.postprocessors,
            TemplateField::Cleanup => &mut self.cleanup,
        }
    }

    /// The file patterns this template applies to
    pub fn globs(&self) -> Vec<String> {
        self.glob.as_ref().map(Value::string_items).unwrap_or_default()
    }

    /// The converter options block
    pub fn pandoc(&self) -> Option<&Mapping> {
        self.pandoc.as_ref().and_then(Value::as_mapping)
    }

    /// Metadata merged into converted documents
    pub fn metadata(&self) -> Option<&Mapping> {
        self.metadata.as_ref().and_then(Value::as_mapping)
    }

    /// Merge `mixin` on top of this template, field by field
    ///
    /// The mixin's value is the current layer, this template's value the
    /// parent. A field whose merge result is absent is removed.
    pub fn mix_in(&mut self, mut mixin: Template) {
        for field in TemplateField::ALL {
            let current = mixin.slot_mut(field).take();
            let slot = self.slot_mut(field);
            *slot = extend_value(current, slot.take());
        }
    }

    /// Apply sequence deltas that had no inherited sequence to edit
    ///
    /// `glob: {add: "*.md"}` on a template without a parent glob becomes
    /// `glob: ["*.md"]` once the template is stored.
    fn settle(&mut self) {
        for field in TemplateField::ALL {
            if field.is_mapping() {
                continue;
            }

            let slot = self.slot_mut(field);
            if let Some(Value::Mapping(mapping)) = slot
                && let Some(delta) = SequenceDelta::from_mapping(mapping)
            {
                *slot = Some(Value::Sequence(delta.apply(Vec::new())));
            }
        }
    }
}

/// Resolve `definition` against already resolved parents
fn resolve<'a, F>(definition: &TemplateDefinition, lookup: F) -> Template
where
    F: Fn(&str) -> Option<&'a Template>,
{
    let mut resolved = Template::default();

    for parent in &definition.extends {
        match lookup(parent) {
            Some(template) => resolved.mix_in(template.clone()),
            None => tracing::warn!(
                "Cannot find template with name '{}'. Skipping it while extending.",
                parent
            ),
        }
    }

    resolved.mix_in(Template::from_definition(definition));
    resolved
}

/// Named, resolved templates in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateStore {
    templates: IndexMap<String, Template>,
}

impl TemplateStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The template registered as `name`
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no template is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in the order they were first registered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Templates with their names in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.templates.iter().map(|(name, template)| (name.as_str(), template))
    }

    /// Resolve a definition against the templates in this store
    ///
    /// Parents named in `extends` are merged in listed order, then the
    /// definition itself. Unknown parents are skipped with a warning.
    pub fn extend_template(&self, definition: &TemplateDefinition) -> Template {
        resolve(definition, |name| self.templates.get(name))
    }

    /// Register a single template
    ///
    /// Its parents must already be registered. An existing template with the
    /// same name is updated with the resolved definition rather than
    /// replaced.
    #[tracing::instrument(level = "debug", skip(self, definition))]
    pub fn reset_template(&mut self, name: &str, definition: &TemplateDefinition) -> &Template {
        let resolved = self.extend_template(definition);

        let template = match self.templates.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.mix_in(resolved);
                existing
            }
            Entry::Vacant(entry) => entry.insert(resolved),
        };
        template.settle();
        template
    }

    /// Register every template of one configuration source
    ///
    /// Definitions may appear in any order: a template is resolved after the
    /// templates it extends from the same source. A template extending its
    /// own name refers to the version registered by an earlier source.
    /// Nothing is registered when the definitions extend each other in a
    /// cycle.
    ///
    /// Returns the registered names in declaration order.
    #[tracing::instrument(level = "debug", skip_all, fields(count = definitions.len()))]
    pub fn register_all(
        &mut self,
        definitions: &IndexMap<String, TemplateDefinition>,
    ) -> Result<Vec<String>> {
        let order = resolution_order(definitions)?;
        let mut staged: IndexMap<&str, Template> = IndexMap::with_capacity(order.len());

        for name in order {
            let Some(definition) = definitions.get(name) else {
                continue;
            };

            let resolved = resolve(definition, |parent| {
                staged
                    .get(parent)
                    .or_else(|| self.templates.get(parent))
            });

            let mut template = match self.templates.get(name) {
                Some(existing) => {
                    let mut existing = existing.clone();
                    existing.mix_in(resolved);
                    existing
                }
                None => resolved,
            };
            template.settle();

            tracing::trace!("Resolved template '{}'", name);
            staged.insert(name, template);
        }

        let mut registered = Vec::with_capacity(definitions.len());
        for name in definitions.keys() {
            if let Some(template) = staged.shift_remove(name.as_str()) {
                self.templates.insert(name.clone(), template);
                registered.push(name.clone());
            }
        }

        Ok(registered)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Order definitions so that parents precede the templates extending them
///
/// Declaration order is kept wherever the `extends` edges allow it. Only
/// edges between definitions of the same source count; self references
/// are left out.
fn resolution_order(definitions: &IndexMap<String, TemplateDefinition>) -> Result<Vec<&str>> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(definitions.len());
    let mut path: Vec<&str> = Vec::new();
    let mut order: Vec<&str> = Vec::with_capacity(definitions.len());

    for name in definitions.keys() {
        visit(name, definitions, &mut marks, &mut path, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    definitions: &'a IndexMap<String, TemplateDefinition>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<&'a str>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
            cycle.push(name.to_string());
            return Err(Error::TemplateCycle { cycle });
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    path.push(name);

    if let Some(definition) = definitions.get(name) {
        for parent in &definition.extends {
            if parent != name && definitions.contains_key(parent) {
                visit(parent, definitions, marks, path, order)?;
            }
        }
    }

    path.pop();
    marks.insert(name, Mark::Done);
    order.push(name);
    Ok(())
}
