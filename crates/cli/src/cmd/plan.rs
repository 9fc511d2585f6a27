//! Plan command implementation
//!
//! Show what a conversion run would do with each file: skip it, leave it
//! alone, or convert it with which templates to which destinations. Nothing
//! is converted.

use clap::Args;
use owo_colors::OwoColorize;
use pandocomatic_config::{CONFIG_FILE_NAME, Configuration, PandocMetadata};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;

/// Show the templates and destinations for source files
#[derive(Debug, Clone, Args)]
pub struct PlanCommand {
    /// Source files to plan
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// One conversion of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// The template used, `None` when only the document's own directive applies
    pub template: Option<String>,
    /// Where the output would be written
    pub destination: PathBuf,
}

/// What would happen to a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Matched by a `skip` pattern
    Skipped,
    /// No template applies and the document has no directive of its own
    NotConverted,
    /// Converted once per entry
    Convert(Vec<Conversion>),
}

impl Command for PlanCommand {
    type Output = Vec<(PathBuf, Outcome)>;

    fn execute(&self, context: &RuntimeContext) -> Result<Self::Output> {
        let mut plans = Vec::with_capacity(self.files.len());

        for file in &self.files {
            let configuration = local_configuration(context, file)?;
            let metadata = read_metadata(file);
            let outcome = plan_file(&configuration, file, &metadata);

            print_outcome(file, &outcome);
            plans.push((file.clone(), outcome));
        }

        Ok(plans)
    }
}

/// The configuration in effect for `file`
///
/// A configuration file next to `file` is layered on top of the global one,
/// unless it is the global configuration file itself.
fn local_configuration<'a>(
    context: &'a RuntimeContext,
    file: &Path,
) -> Result<Cow<'a, Configuration>> {
    let configuration = context.configuration();

    let Some(dir) = file.parent() else {
        return Ok(Cow::Borrowed(configuration));
    };

    let local = dir.join(CONFIG_FILE_NAME);
    if !local.is_file() || context.config_path().is_some_and(|path| same_file(path, &local)) {
        return Ok(Cow::Borrowed(configuration));
    }

    tracing::debug!("Layering {} for {}", local.display(), file.display());
    Ok(Cow::Owned(configuration.reconfigure(&local)?))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// The document's metadata, or none when it cannot be read
fn read_metadata(file: &Path) -> PandocMetadata {
    match PandocMetadata::from_file(file) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("No metadata for {}: {}", file.display(), e);
            PandocMetadata::empty()
        }
    }
}

/// Decide what happens to `file` under `configuration`
///
/// Templates named in the document's `use-template` replace the ones
/// selected by glob.
pub fn plan_file(configuration: &Configuration, file: &Path, metadata: &PandocMetadata) -> Outcome {
    if configuration.skip(file) {
        return Outcome::Skipped;
    }

    let requested: Vec<String> = metadata
        .use_templates()
        .into_iter()
        .filter(|name| {
            let known = configuration.has_template(name);
            if !known {
                tracing::warn!(
                    "{} asks for template '{}', which does not exist",
                    file.display(),
                    name
                );
            }
            known
        })
        .collect();

    let templates: Vec<Option<&str>> = if requested.is_empty() {
        configuration
            .determine_templates(file)
            .into_iter()
            .map(Some)
            .collect()
    } else {
        requested.iter().map(|name| Some(name.as_str())).collect()
    };

    if templates.is_empty() {
        if !metadata.has_pandocomatic() {
            return Outcome::NotConverted;
        }
        return Outcome::Convert(vec![Conversion {
            template: None,
            destination: configuration.set_destination(file, None, metadata),
        }]);
    }

    Outcome::Convert(
        templates
            .into_iter()
            .map(|template| Conversion {
                template: template.map(str::to_string),
                destination: configuration.set_destination(file, template, metadata),
            })
            .collect(),
    )
}

fn print_outcome(file: &Path, outcome: &Outcome) {
    match outcome {
        Outcome::Skipped => {
            println!("{}  {}", file.display().bright_white(), "skipped".dimmed());
        }
        Outcome::NotConverted => {
            println!(
                "{}  {}",
                file.display().bright_white(),
                "no matching template".yellow()
            );
        }
        Outcome::Convert(conversions) => {
            println!("{}", file.display().bright_white().bold());
            for conversion in conversions {
                println!(
                    "  {} {} {}",
                    conversion.template.as_deref().unwrap_or("(document)").bright_cyan(),
                    "→".dimmed(),
                    conversion.destination.display().bright_green()
                );
            }
        }
    }
}
